//! Voice selection
//!
//! Picks one voice from the synthesizer catalog: language filter first, then
//! the preference list, then catalog order.

use std::sync::{Arc, PoisonError, RwLock};

use super::Voice;
use crate::config::VoiceConfig;

/// Ordered voice name substrings, most preferred first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoicePreference(Vec<String>);

impl VoicePreference {
    /// Create a preference list
    #[must_use]
    pub const fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    /// Preferred substrings in priority order
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

/// Shared cell holding the currently selected voice
///
/// Written by [`VoiceSelector`] on catalog updates, read by every dispatch.
#[derive(Debug, Clone, Default)]
pub struct SelectedVoice(Arc<RwLock<Option<Voice>>>);

impl SelectedVoice {
    /// Create an empty cell
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current selection
    #[must_use]
    pub fn get(&self) -> Option<Voice> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, voice: Option<Voice>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = voice;
    }
}

/// Pick a voice from `catalog`
///
/// Only voices whose language tag starts with `language_prefix` are
/// considered. Preference order dominates catalog order: the first preferred
/// substring found in any candidate's name wins. With no preferred match the
/// first candidate is used. Returns `None` when no candidate exists.
#[must_use]
pub fn select_voice<'a>(
    catalog: &'a [Voice],
    language_prefix: &str,
    preference: &VoicePreference,
) -> Option<&'a Voice> {
    let candidates: Vec<&Voice> = catalog
        .iter()
        .filter(|v| v.language_tag.starts_with(language_prefix))
        .collect();

    preference
        .names()
        .iter()
        .find_map(|wanted| {
            candidates
                .iter()
                .find(|v| v.name.contains(wanted.as_str()))
                .copied()
        })
        .or_else(|| candidates.first().copied())
}

/// Chooses the voice used for all spoken output
#[derive(Debug, Clone)]
pub struct VoiceSelector {
    language_prefix: String,
    preference: VoicePreference,
    selected: SelectedVoice,
}

impl VoiceSelector {
    /// Create a selector from voice configuration
    #[must_use]
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            language_prefix: config.language_prefix.clone(),
            preference: VoicePreference::new(config.preferred.clone()),
            selected: SelectedVoice::new(),
        }
    }

    /// Handle to the selection cell, for injection into the dispatcher
    #[must_use]
    pub fn selected(&self) -> SelectedVoice {
        self.selected.clone()
    }

    /// Recompute the selection from a freshly delivered catalog
    ///
    /// Overwrites any previous selection, including with `None`.
    pub fn on_catalog(&self, catalog: &[Voice]) -> Option<Voice> {
        let chosen = select_voice(catalog, &self.language_prefix, &self.preference).cloned();

        match &chosen {
            Some(voice) => {
                tracing::info!(
                    voice = %voice.name,
                    lang = %voice.language_tag,
                    "voice selected"
                );
            }
            None => {
                tracing::warn!(
                    prefix = %self.language_prefix,
                    catalog = catalog.len(),
                    "no matching voices found, using synthesizer default"
                );
            }
        }

        self.selected.set(chosen.clone());
        chosen
    }
}
