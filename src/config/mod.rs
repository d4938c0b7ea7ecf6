//! Configuration management for Navix

pub mod file;

use std::time::Duration;

use crate::{Error, Result};

/// Default assistant name used in the greeting
pub const DEFAULT_NAME: &str = "Navix";

/// Default voice name preferences, most preferred first
pub const DEFAULT_PREFERRED_VOICES: &[&str] = &[
    "Samantha",
    "Susan",
    "Google UK English Female",
    "Google US English",
];

/// Default pitch multiplier applied to every utterance
pub const DEFAULT_PITCH: f32 = 1.6;

/// Default rate multiplier applied to every utterance
pub const DEFAULT_RATE: f32 = 1.1;

/// Default pause between the greeting and the start of capture
pub const DEFAULT_LISTEN_DELAY: Duration = Duration::from_millis(4000);

/// Navix configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Name the assistant introduces itself with
    pub name: String,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Recognition session configuration
    pub recognition: RecognitionConfig,

    /// Resource opener configuration
    pub opener: OpenerConfig,
}

/// Which synthesizer backend to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynthesizerKind {
    /// Speak through the `espeak-ng` command
    #[default]
    Espeak,
    /// Only log utterances
    Log,
}

impl SynthesizerKind {
    /// Parse a backend name, case-insensitively
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "espeak" | "espeak-ng" => Some(Self::Espeak),
            "log" | "none" | "silent" => Some(Self::Log),
            _ => None,
        }
    }
}

/// Voice selection and prosody configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Language tag prefix voices must start with
    pub language_prefix: String,

    /// Ordered voice name substrings, most preferred first
    pub preferred: Vec<String>,

    /// Pitch multiplier (0.0 to 2.0)
    pub pitch: f32,

    /// Rate multiplier (0.1 to 10.0)
    pub rate: f32,

    /// Synthesizer backend
    pub synthesizer: SynthesizerKind,

    /// Path or name of the espeak-ng binary
    pub espeak_binary: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language_prefix: "en".to_string(),
            preferred: DEFAULT_PREFERRED_VOICES
                .iter()
                .map(ToString::to_string)
                .collect(),
            pitch: DEFAULT_PITCH,
            rate: DEFAULT_RATE,
            synthesizer: SynthesizerKind::default(),
            espeak_binary: "espeak-ng".to_string(),
        }
    }
}

/// Recognition session configuration
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// Locale for recognition and time formatting
    pub locale: String,

    /// Delay between the greeting and the start of capture
    pub listen_delay: Duration,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            listen_delay: DEFAULT_LISTEN_DELAY,
        }
    }
}

/// Resource opener configuration
#[derive(Debug, Clone, Default)]
pub struct OpenerConfig {
    /// Explicit opener command; platform default when unset
    pub command: Option<String>,

    /// Log URLs instead of opening them
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            voice: VoiceConfig::default(),
            recognition: RecognitionConfig::default(),
            opener: OpenerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if a value is malformed or out of range
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a value is malformed or out of range
    pub fn from_sources<F>(fc: file::NavixConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let name = env("NAVIX_NAME")
            .or(fc.assistant.name)
            .unwrap_or(default.name);

        let synthesizer = match env("NAVIX_SYNTHESIZER").or(fc.voice.synthesizer) {
            Some(s) => SynthesizerKind::parse(&s)
                .ok_or_else(|| Error::Config(format!("unknown synthesizer: {s}")))?,
            None => default.voice.synthesizer,
        };

        let voice = VoiceConfig {
            language_prefix: env("NAVIX_VOICE_LANG")
                .or(fc.voice.language_prefix)
                .unwrap_or(default.voice.language_prefix),
            preferred: env("NAVIX_VOICE_PREFERRED")
                .map(|s| {
                    s.split(',')
                        .map(|n| n.trim().to_string())
                        .filter(|n| !n.is_empty())
                        .collect()
                })
                .or(fc.voice.preferred)
                .unwrap_or(default.voice.preferred),
            pitch: parse_env(&env, "NAVIX_PITCH")?
                .or(fc.voice.pitch)
                .unwrap_or(default.voice.pitch),
            rate: parse_env(&env, "NAVIX_RATE")?
                .or(fc.voice.rate)
                .unwrap_or(default.voice.rate),
            synthesizer,
            espeak_binary: env("NAVIX_ESPEAK_BINARY")
                .or(fc.voice.espeak_binary)
                .unwrap_or(default.voice.espeak_binary),
        };

        let recognition = RecognitionConfig {
            locale: env("NAVIX_LOCALE")
                .or(fc.recognition.locale)
                .unwrap_or(default.recognition.locale),
            listen_delay: parse_env::<u64, _>(&env, "NAVIX_LISTEN_DELAY_MS")?
                .or(fc.recognition.listen_delay_ms)
                .map_or(default.recognition.listen_delay, Duration::from_millis),
        };

        let opener = OpenerConfig {
            command: env("NAVIX_OPENER").or(fc.opener.command),
            dry_run: env("NAVIX_DRY_RUN")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .or(fc.opener.dry_run)
                .unwrap_or(default.opener.dry_run),
        };

        let config = Self {
            name,
            voice,
            recognition,
            opener,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns error if pitch, rate or language prefix are invalid
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.voice.pitch) {
            return Err(Error::Config(format!(
                "invalid pitch: {}. Must be between 0.0 and 2.0",
                self.voice.pitch
            )));
        }
        if !(0.1..=10.0).contains(&self.voice.rate) {
            return Err(Error::Config(format!(
                "invalid rate: {}. Must be between 0.1 and 10.0",
                self.voice.rate
            )));
        }
        if self.voice.language_prefix.trim().is_empty() {
            return Err(Error::Config(
                "voice language prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse an optional env value, failing on garbage rather than ignoring it
fn parse_env<T, F>(env: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid value for {key}: {raw}")))
        })
        .transpose()
}
