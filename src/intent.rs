//! Intent resolution
//!
//! Classifies a transcript with a static, priority-ordered rule table. Rules
//! match on substring containment and the first match wins. The table ends in
//! an unconditional web-search rule, so every transcript resolves to exactly
//! one [`Intent`].

use std::fmt;

use serde::Serialize;

/// One recognized utterance, lowercased
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript(String);

impl Transcript {
    /// Normalize raw recognizer output (case-folding only)
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().to_lowercase())
    }

    /// Normalized text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sites that can be opened directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Destination {
    YouTube,
    Google,
    Facebook,
    Instagram,
    WhatsApp,
}

impl Destination {
    /// Landing page URL
    #[must_use]
    pub const fn url(self) -> &'static str {
        match self {
            Self::YouTube => "https://www.youtube.com",
            Self::Google => "https://www.google.com",
            Self::Facebook => "https://www.facebook.com",
            Self::Instagram => "https://www.instagram.com",
            Self::WhatsApp => "https://web.whatsapp.com",
        }
    }

    /// Spoken confirmation before opening
    #[must_use]
    pub const fn confirmation(self) -> &'static str {
        match self {
            Self::YouTube => "Opening YouTube.",
            Self::Google => "Directing to Google's main page.",
            Self::Facebook => "Opening Facebook.",
            Self::Instagram => "Opening Instagram.",
            Self::WhatsApp => "Opening WhatsApp.",
        }
    }
}

/// Sites that accept a search query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SearchEngine {
    YouTube,
    Wikipedia,
    Google,
}

impl SearchEngine {
    /// Display name used in spoken phrases
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::Wikipedia => "Wikipedia",
            Self::Google => "Google",
        }
    }

    /// Results page URL for `query`, percent-encoded
    #[must_use]
    pub fn results_url(self, query: &str) -> String {
        let base = match self {
            Self::YouTube => "https://www.youtube.com/results?search_query=",
            Self::Wikipedia => "https://en.wikipedia.org/wiki/Special:Search?search=",
            Self::Google => "https://www.google.com/search?q=",
        };
        format!("{base}{}", urlencoding::encode(query))
    }
}

/// Closed set of things an utterance can mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IntentKind {
    /// Open a site's landing page
    OpenDestination(Destination),
    /// "How are you"
    StatusQuery,
    /// Report the current time
    TimeQuery,
    /// Search a specific site for the extracted parameter
    SearchDestination(SearchEngine),
    /// Nothing matched; search the web for the whole transcript
    GenericWebSearch,
}

/// Classified utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Intent {
    /// What the utterance asks for
    pub kind: IntentKind,
    /// Extracted argument, present only for parametrized kinds
    pub parameter: Option<String>,
}

/// When a rule fires
#[derive(Debug, Clone, Copy)]
pub enum Trigger {
    /// Transcript contains any of these substrings
    Contains(&'static [&'static str]),
    /// Always
    Always,
}

impl Trigger {
    /// The first trigger substring found in `text`, or `""` for [`Trigger::Always`]
    fn find(self, text: &str) -> Option<&'static str> {
        match self {
            Self::Contains(needles) => needles.iter().copied().find(|n| text.contains(n)),
            Self::Always => Some(""),
        }
    }
}

/// How a rule derives its parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// No parameter
    None,
    /// Transcript with the first occurrence of the trigger removed, trimmed
    Remainder,
    /// The whole transcript as-is
    Verbatim,
}

/// One row of the rule table
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Match condition
    pub trigger: Trigger,
    /// Intent produced on match
    pub kind: IntentKind,
    /// Parameter extraction
    pub extraction: Extraction,
}

impl Rule {
    const fn on(triggers: &'static [&'static str], kind: IntentKind) -> Self {
        Self {
            trigger: Trigger::Contains(triggers),
            kind,
            extraction: Extraction::None,
        }
    }

    const fn with_remainder(triggers: &'static [&'static str], kind: IntentKind) -> Self {
        Self {
            trigger: Trigger::Contains(triggers),
            kind,
            extraction: Extraction::Remainder,
        }
    }

    /// Apply this rule, yielding an intent when it matches
    #[must_use]
    pub fn apply(&self, transcript: &Transcript) -> Option<Intent> {
        let text = transcript.as_str();
        let matched = self.trigger.find(text)?;

        let parameter = match self.extraction {
            Extraction::None => None,
            Extraction::Remainder => Some(text.replacen(matched, "", 1).trim().to_string()),
            Extraction::Verbatim => Some(text.to_string()),
        };

        Some(Intent {
            kind: self.kind,
            parameter,
        })
    }
}

/// The rule table, highest priority first
pub const RULES: &[Rule] = &[
    Rule::on(&["open youtube"], IntentKind::OpenDestination(Destination::YouTube)),
    Rule::on(&["open google"], IntentKind::OpenDestination(Destination::Google)),
    Rule::on(&["open facebook"], IntentKind::OpenDestination(Destination::Facebook)),
    Rule::on(&["open instagram"], IntentKind::OpenDestination(Destination::Instagram)),
    Rule::on(&["open whatsapp"], IntentKind::OpenDestination(Destination::WhatsApp)),
    Rule::on(&["how are you"], IntentKind::StatusQuery),
    Rule::on(&["what time is it", "time please"], IntentKind::TimeQuery),
    Rule::with_remainder(
        &["search youtube for"],
        IntentKind::SearchDestination(SearchEngine::YouTube),
    ),
    Rule::with_remainder(
        &["search wikipedia for"],
        IntentKind::SearchDestination(SearchEngine::Wikipedia),
    ),
    Rule {
        trigger: Trigger::Always,
        kind: IntentKind::GenericWebSearch,
        extraction: Extraction::Verbatim,
    },
];

/// Classify a transcript
///
/// # Panics
///
/// Never in practice: the last entry of [`RULES`] matches every transcript.
#[must_use]
pub fn resolve(transcript: &Transcript) -> Intent {
    RULES
        .iter()
        .find_map(|rule| rule.apply(transcript))
        .unwrap_or_else(|| unreachable!("rule table ends in Trigger::Always"))
}
