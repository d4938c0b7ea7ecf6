//! Voice module
//!
//! Voice catalog types, preference-driven voice selection, and the speech
//! synthesis and recognition collaborator seams

mod selector;
mod stt;
mod tts;

pub use selector::{SelectedVoice, VoicePreference, VoiceSelector, select_voice};
pub use stt::{LineRecognizer, RecognitionOutcome, Recognizer};
pub use tts::{
    EspeakSynthesizer, LogSynthesizer, SpeechRequest, Synthesizer, espeak_pitch, espeak_speed,
    parse_espeak_voices,
};

/// Build the configured synthesizer
pub use tts::from_config as synthesizer_from_config;

use serde::{Deserialize, Serialize};

/// One synthesis voice offered by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Voice identifier as reported by the synthesizer
    pub name: String,
    /// BCP 47-ish language tag (e.g. "en-US")
    pub language_tag: String,
}

impl Voice {
    /// Create a voice record
    pub fn new(name: impl Into<String>, language_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language_tag: language_tag.into(),
        }
    }
}
