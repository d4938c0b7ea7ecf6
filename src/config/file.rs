//! TOML configuration file loading
//!
//! Supports `~/.config/navix/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct NavixConfigFile {
    /// Assistant identity
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// Voice selection and prosody
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Recognition session settings
    #[serde(default)]
    pub recognition: RecognitionFileConfig,

    /// Resource opener settings
    #[serde(default)]
    pub opener: OpenerFileConfig,
}

/// Assistant identity
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// Name used in the greeting (e.g. "Navix")
    pub name: Option<String>,
}

/// Voice configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Language tag prefix voices must start with (e.g. "en")
    pub language_prefix: Option<String>,

    /// Ordered voice name substrings, most preferred first
    pub preferred: Option<Vec<String>>,

    /// Pitch multiplier
    pub pitch: Option<f32>,

    /// Rate multiplier
    pub rate: Option<f32>,

    /// Synthesizer backend ("espeak" or "log")
    pub synthesizer: Option<String>,

    /// Path or name of the espeak-ng binary
    pub espeak_binary: Option<String>,
}

/// Recognition configuration
#[derive(Debug, Default, Deserialize)]
pub struct RecognitionFileConfig {
    /// Locale used for recognition and time formatting (e.g. "en-US")
    pub locale: Option<String>,

    /// Delay between the greeting and the start of capture
    pub listen_delay_ms: Option<u64>,
}

/// Opener configuration
#[derive(Debug, Default, Deserialize)]
pub struct OpenerFileConfig {
    /// Command used to open URLs (overrides platform detection)
    pub command: Option<String>,

    /// Log URLs instead of opening them
    pub dry_run: Option<bool>,
}

/// Load the TOML config file from the standard path
///
/// Returns `NavixConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> NavixConfigFile {
    let Some(path) = config_file_path() else {
        return NavixConfigFile::default();
    };

    if !path.exists() {
        return NavixConfigFile::default();
    }

    match load_config_file_from(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            NavixConfigFile::default()
        }
    }
}

/// Parse a config file at an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn load_config_file_from(path: &Path) -> Result<NavixConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path: `~/.config/navix/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("navix").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_parses() {
        let fc: NavixConfigFile = toml::from_str(
            r#"
            [voice]
            pitch = 1.2
            preferred = ["Karen"]
            "#,
        )
        .unwrap();

        assert!(fc.voice.pitch.is_some_and(|p| (p - 1.2).abs() < f32::EPSILON));
        assert_eq!(fc.voice.preferred, Some(vec!["Karen".to_string()]));
        assert!(fc.voice.rate.is_none());
        assert!(fc.assistant.name.is_none());
        assert!(fc.opener.dry_run.is_none());
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[recognition]\nlocale = \"en-GB\"\nlisten_delay_ms = 1500\n",
        )
        .unwrap();

        let fc = load_config_file_from(&path).unwrap();
        assert_eq!(fc.recognition.locale.as_deref(), Some("en-GB"));
        assert_eq!(fc.recognition.listen_delay_ms, Some(1500));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[voice\npitch = ").unwrap();

        assert!(matches!(
            load_config_file_from(&path),
            Err(crate::Error::Toml(_))
        ));
    }

    #[test]
    fn test_empty_file_is_default() {
        let fc: NavixConfigFile = toml::from_str("").unwrap();
        assert!(fc.recognition.locale.is_none());
        assert!(fc.recognition.listen_delay_ms.is_none());
    }
}
