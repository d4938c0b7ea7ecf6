//! Action dispatch
//!
//! Maps a resolved [`Intent`] to spoken confirmations and at most one open
//! request. Planning is pure; execution talks to the collaborators.

use std::sync::Arc;

use chrono::{Local, NaiveTime};
use serde::Serialize;

use crate::intent::{Intent, IntentKind, SearchEngine, Transcript};
use crate::opener::{OpenRequest, ResourceOpener};
use crate::voice::{SelectedVoice, SpeechRequest, Synthesizer};
use crate::Result;

/// Fixed reply to a status query
pub const STATUS_PHRASE: &str =
    "I'm running perfectly, thanks for asking! Feeling electric today.";

/// Apology spoken when recognition fails
pub const RECOGNITION_ERROR_PHRASE: &str =
    "There was a speech recognition error. Please try again.";

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    /// Current local time of day
    fn now(&self) -> NaiveTime;
}

/// Reads the system clock in the local timezone
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// Pitch and rate applied uniformly to every utterance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prosody {
    /// Pitch multiplier
    pub pitch: f32,
    /// Rate multiplier
    pub rate: f32,
}

/// Everything one dispatch will do, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchPlan {
    /// Utterances to speak, acknowledgment first
    pub utterances: Vec<String>,
    /// Resource to open after speaking, if any
    pub open: Option<OpenRequest>,
}

/// Generic acknowledgment quoting the transcript
#[must_use]
pub fn acknowledgment(transcript: &Transcript) -> String {
    format!("I heard: {transcript}. Executing command.")
}

/// Format a time of day the way `locale` reads it aloud
///
/// `en-US` gets a 12-hour clock with two-digit minutes and an AM/PM marker
/// ("3:07 PM"); other locales get a 24-hour clock.
#[must_use]
pub fn format_time(time: NaiveTime, locale: &str) -> String {
    if locale.eq_ignore_ascii_case("en-US") {
        time.format("%-I:%M %p").to_string()
    } else {
        time.format("%H:%M").to_string()
    }
}

/// Plan the dispatch of `intent` without performing it
#[must_use]
pub fn plan(transcript: &Transcript, intent: &Intent, now: NaiveTime, locale: &str) -> DispatchPlan {
    let mut utterances = vec![acknowledgment(transcript)];
    let parameter = intent.parameter.as_deref().unwrap_or_default();

    let open = match intent.kind {
        IntentKind::OpenDestination(dest) => {
            utterances.push(dest.confirmation().to_string());
            Some(OpenRequest::new_context(dest.url()))
        }
        IntentKind::StatusQuery => {
            utterances.push(STATUS_PHRASE.to_string());
            None
        }
        IntentKind::TimeQuery => {
            utterances.push(format!(
                "The current time is {}.",
                format_time(now, locale)
            ));
            None
        }
        IntentKind::SearchDestination(engine) => {
            utterances.push(format!("Searching {} for {parameter}", engine.name()));
            Some(OpenRequest::new_context(engine.results_url(parameter)))
        }
        IntentKind::GenericWebSearch => {
            utterances.push(format!(
                "Command not directly recognized. Searching {} for {parameter}",
                SearchEngine::Google.name()
            ));
            Some(OpenRequest::new_context(
                SearchEngine::Google.results_url(parameter),
            ))
        }
    };

    DispatchPlan { utterances, open }
}

/// Executes intents against the synthesis and opener collaborators
pub struct Dispatcher {
    synthesizer: Arc<dyn Synthesizer>,
    opener: Arc<dyn ResourceOpener>,
    clock: Arc<dyn Clock>,
    voice: SelectedVoice,
    prosody: Prosody,
    locale: String,
}

impl Dispatcher {
    /// Create a dispatcher
    ///
    /// `voice` is read on every utterance, so later catalog updates apply
    /// without rebuilding the dispatcher.
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        opener: Arc<dyn ResourceOpener>,
        voice: SelectedVoice,
        prosody: Prosody,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            synthesizer,
            opener,
            clock: Arc::new(SystemClock),
            voice,
            prosody,
            locale: locale.into(),
        }
    }

    /// Replace the clock used for time queries
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the synthesis request for `text` with the current voice
    #[must_use]
    pub fn speech_request(&self, text: &str) -> SpeechRequest {
        SpeechRequest {
            text: text.to_string(),
            voice: self.voice.get(),
            pitch: self.prosody.pitch,
            rate: self.prosody.rate,
        }
    }

    /// Speak one utterance
    ///
    /// # Errors
    ///
    /// Returns error if the synthesizer fails
    pub async fn speak(&self, text: &str) -> Result<()> {
        self.synthesizer.speak(&self.speech_request(text)).await
    }

    /// Speak one utterance, logging instead of returning failures
    pub async fn say(&self, text: &str) {
        if let Err(e) = self.speak(text).await {
            tracing::warn!(error = %e, text, "failed to speak");
        }
    }

    /// Plan `intent` against the current clock
    #[must_use]
    pub fn plan(&self, transcript: &Transcript, intent: &Intent) -> DispatchPlan {
        plan(transcript, intent, self.clock.now(), &self.locale)
    }

    /// Carry out `intent`
    ///
    /// Every utterance is attempted and the open request is always issued.
    /// Speech failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns the open failure, if any; speech failures are only logged
    pub async fn dispatch(&self, transcript: &Transcript, intent: &Intent) -> Result<DispatchPlan> {
        let plan = self.plan(transcript, intent);
        tracing::info!(
            kind = ?intent.kind,
            parameter = ?intent.parameter,
            open = ?plan.open.as_ref().map(|o| &o.url),
            "dispatching"
        );

        for text in &plan.utterances {
            self.say(text).await;
        }

        if let Some(request) = &plan.open {
            if let Err(e) = self.opener.open(request).await {
                tracing::warn!(error = %e, url = %request.url, "failed to open");
                return Err(e);
            }
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{Destination, resolve};

    fn noon_ish() -> NaiveTime {
        NaiveTime::from_hms_opt(15, 7, 42).unwrap()
    }

    fn plan_for(raw: &str) -> DispatchPlan {
        let transcript = Transcript::new(raw);
        let intent = resolve(&transcript);
        plan(&transcript, &intent, noon_ish(), "en-US")
    }

    #[test]
    fn test_acknowledgment_comes_first() {
        for raw in ["open google", "how are you", "", "play some music"] {
            let plan = plan_for(raw);
            assert_eq!(
                plan.utterances[0],
                format!("I heard: {raw}. Executing command.")
            );
            assert_eq!(plan.utterances.len(), 2);
        }
    }

    #[test]
    fn test_open_destination_plan() {
        let plan = plan_for("open google");
        assert_eq!(plan.utterances[1], "Directing to Google's main page.");
        assert_eq!(plan.open, Some(OpenRequest::new_context("https://www.google.com")));

        let plan = plan_for("open whatsapp");
        assert_eq!(
            plan.open.map(|o| o.url),
            Some(Destination::WhatsApp.url().to_string())
        );
    }

    #[test]
    fn test_status_plan_opens_nothing() {
        let plan = plan_for("how are you");
        assert_eq!(plan.utterances[1], STATUS_PHRASE);
        assert!(plan.open.is_none());
    }

    #[test]
    fn test_time_plan() {
        let plan = plan_for("what time is it");
        assert_eq!(plan.utterances[1], "The current time is 3:07 PM.");
        assert!(plan.open.is_none());
    }

    #[test]
    fn test_format_time() {
        let morning = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        let midnight = NaiveTime::from_hms_opt(0, 30, 0).unwrap();

        assert_eq!(format_time(morning, "en-US"), "9:05 AM");
        assert_eq!(format_time(midnight, "en-us"), "12:30 AM");
        assert_eq!(format_time(noon_ish(), "en-GB"), "15:07");
    }

    #[test]
    fn test_search_plan() {
        let plan = plan_for("search wikipedia for quantum tunneling");
        assert_eq!(plan.utterances[1], "Searching Wikipedia for quantum tunneling");
        assert_eq!(
            plan.open.map(|o| o.url),
            Some("https://en.wikipedia.org/wiki/Special:Search?search=quantum%20tunneling".to_string())
        );
    }

    #[test]
    fn test_empty_search_plan() {
        let plan = plan_for("search youtube for");
        assert_eq!(plan.utterances[1], "Searching YouTube for ");
        assert_eq!(
            plan.open.map(|o| o.url),
            Some("https://www.youtube.com/results?search_query=".to_string())
        );
    }

    #[test]
    fn test_fallback_plan() {
        let plan = plan_for("Play some music");
        assert_eq!(
            plan.utterances[1],
            "Command not directly recognized. Searching Google for play some music"
        );
        assert_eq!(
            plan.open.map(|o| o.url),
            Some("https://www.google.com/search?q=play%20some%20music".to_string())
        );
    }
}
