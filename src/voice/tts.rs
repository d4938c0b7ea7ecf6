//! Text-to-speech (TTS) collaborators
//!
//! The engine only ever hands a [`SpeechRequest`] to a [`Synthesizer`]; the
//! concrete backends here drive `espeak-ng` or just log.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::Voice;
use crate::config::{SynthesizerKind, VoiceConfig};
use crate::{Error, Result};

/// Upper bound on a single spoken utterance
const SPEAK_TIMEOUT: Duration = Duration::from_secs(30);

/// espeak-ng default pitch (0-99 scale)
const ESPEAK_BASE_PITCH: f32 = 50.0;

/// espeak-ng default speed in words per minute
const ESPEAK_BASE_SPEED: f32 = 175.0;

/// One utterance to be spoken
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    /// Text to speak
    pub text: String,
    /// Voice to use; synthesizer default when `None`
    pub voice: Option<Voice>,
    /// Pitch multiplier
    pub pitch: f32,
    /// Rate multiplier
    pub rate: f32,
}

/// Speech synthesis backend
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Backend identifier (e.g. "espeak-ng")
    fn id(&self) -> &'static str;

    /// Voices this backend can speak with
    async fn voices(&self) -> Result<Vec<Voice>>;

    /// Speak one utterance, returning once it has been handed off or played
    async fn speak(&self, request: &SpeechRequest) -> Result<()>;
}

/// Build a synthesizer from configuration
///
/// Falls back to logging when `espeak-ng` is not installed.
#[must_use]
pub fn from_config(config: &VoiceConfig) -> Box<dyn Synthesizer> {
    match config.synthesizer {
        SynthesizerKind::Log => Box::new(LogSynthesizer),
        SynthesizerKind::Espeak => match EspeakSynthesizer::new(&config.espeak_binary) {
            Ok(synth) => Box::new(synth),
            Err(e) => {
                tracing::warn!(error = %e, "speech disabled, utterances will only be logged");
                Box::new(LogSynthesizer)
            }
        },
    }
}

/// Map a pitch multiplier onto espeak-ng's 0-99 pitch scale
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn espeak_pitch(multiplier: f32) -> u32 {
    (ESPEAK_BASE_PITCH * multiplier).round().clamp(0.0, 99.0) as u32
}

/// Map a rate multiplier onto espeak-ng words per minute
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn espeak_speed(multiplier: f32) -> u32 {
    (ESPEAK_BASE_SPEED * multiplier).round().clamp(80.0, 450.0) as u32
}

/// Parse the table printed by `espeak-ng --voices`
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  2  en-us           --/M      English_(America)  gmw/en-US           (en 10)
/// ```
#[must_use]
pub fn parse_espeak_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return None;
            }
            Some(Voice::new(fields[3], fields[1]))
        })
        .collect()
}

/// Speaks through the `espeak-ng` command-line synthesizer
pub struct EspeakSynthesizer {
    binary: PathBuf,
}

impl EspeakSynthesizer {
    /// Create a backend, resolving `binary` on `PATH`
    ///
    /// # Errors
    ///
    /// Returns error if the binary cannot be found
    pub fn new(binary: &str) -> Result<Self> {
        let binary = which::which(binary)
            .map_err(|e| Error::Tts(format!("{binary} not found: {e}")))?;
        tracing::debug!(binary = %binary.display(), "espeak-ng synthesizer initialized");
        Ok(Self { binary })
    }

    /// Command-line arguments for a request (text goes on stdin)
    #[must_use]
    pub fn args(request: &SpeechRequest) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            espeak_pitch(request.pitch).to_string(),
            "-s".to_string(),
            espeak_speed(request.rate).to_string(),
        ];
        if let Some(voice) = &request.voice {
            args.push("-v".to_string());
            args.push(voice.name.clone());
        }
        args.push("--stdin".to_string());
        args
    }
}

#[async_trait]
impl Synthesizer for EspeakSynthesizer {
    fn id(&self) -> &'static str {
        "espeak-ng"
    }

    async fn voices(&self) -> Result<Vec<Voice>> {
        let output = Command::new(&self.binary).arg("--voices").output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Voice(format!("espeak-ng --voices failed: {stderr}")));
        }

        Ok(parse_espeak_voices(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn speak(&self, request: &SpeechRequest) -> Result<()> {
        tracing::debug!(text = %request.text, voice = ?request.voice.as_ref().map(|v| &v.name), "speaking");

        let mut child = Command::new(&self.binary)
            .args(Self::args(request))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(request.text.as_bytes()).await?;
        }

        let output = tokio::time::timeout(SPEAK_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| Error::Tts(format!("espeak-ng timed out after {SPEAK_TIMEOUT:?}")))??;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(Error::Tts(format!("espeak-ng error: {stderr}")))
        }
    }
}

/// Logs utterances instead of speaking them
#[derive(Debug, Default)]
pub struct LogSynthesizer;

#[async_trait]
impl Synthesizer for LogSynthesizer {
    fn id(&self) -> &'static str {
        "log"
    }

    async fn voices(&self) -> Result<Vec<Voice>> {
        Ok(Vec::new())
    }

    async fn speak(&self, request: &SpeechRequest) -> Result<()> {
        tracing::info!(
            text = %request.text,
            voice = ?request.voice.as_ref().map(|v| &v.name),
            pitch = request.pitch,
            rate = request.rate,
            "say"
        );
        Ok(())
    }
}
