//! Shared test doubles
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveTime;
use navix::opener::{OpenRequest, ResourceOpener};
use navix::voice::{RecognitionOutcome, Recognizer, SpeechRequest, Synthesizer, Voice};
use navix::{Clock, Config, Daemon, Error};

/// Config with no pre-listening delay
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.recognition.listen_delay = Duration::ZERO;
    config
}

/// Synthesizer that records every request
#[derive(Default)]
pub struct RecordingSynthesizer {
    pub catalog: Vec<Voice>,
    pub spoken: Arc<Mutex<Vec<SpeechRequest>>>,
    pub fail: bool,
}

impl RecordingSynthesizer {
    pub fn with_catalog(catalog: Vec<Voice>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.text.clone())
            .collect()
    }
}

#[async_trait]
impl Synthesizer for RecordingSynthesizer {
    fn id(&self) -> &'static str {
        "recording"
    }

    async fn voices(&self) -> navix::Result<Vec<Voice>> {
        Ok(self.catalog.clone())
    }

    async fn speak(&self, request: &SpeechRequest) -> navix::Result<()> {
        self.spoken.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(Error::Tts("speaker unplugged".to_string()));
        }
        Ok(())
    }
}

/// Opener that records every request
#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Arc<Mutex<Vec<OpenRequest>>>,
    pub fail: bool,
}

impl RecordingOpener {
    pub fn urls(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }
}

#[async_trait]
impl ResourceOpener for RecordingOpener {
    fn id(&self) -> &'static str {
        "recording"
    }

    async fn open(&self, request: &OpenRequest) -> navix::Result<()> {
        self.opened.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(Error::Open("no browser".to_string()));
        }
        Ok(())
    }
}

/// Recognizer that replays scripted outcomes, then cancels
#[derive(Default)]
pub struct ScriptedRecognizer {
    outcomes: VecDeque<RecognitionOutcome>,
    pub listens: usize,
    pub stops: usize,
}

impl ScriptedRecognizer {
    pub fn new(outcomes: Vec<RecognitionOutcome>) -> Self {
        Self {
            outcomes: outcomes.into(),
            ..Self::default()
        }
    }

    pub fn transcripts(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|t| RecognitionOutcome::Transcript((*t).to_string()))
                .collect(),
        )
    }
}

#[async_trait]
impl Recognizer for ScriptedRecognizer {
    async fn listen(&mut self) -> RecognitionOutcome {
        self.listens += 1;
        self.outcomes
            .pop_front()
            .unwrap_or(RecognitionOutcome::Cancelled)
    }

    async fn stop(&mut self) {
        self.stops += 1;
    }
}

/// Recognizer whose capture never produces an outcome
#[derive(Default)]
pub struct HangingRecognizer {
    pub listens: Arc<AtomicUsize>,
}

impl HangingRecognizer {
    pub fn listens(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.listens)
    }
}

#[async_trait]
impl Recognizer for HangingRecognizer {
    async fn listen(&mut self) -> RecognitionOutcome {
        self.listens.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    async fn stop(&mut self) {}
}

/// Clock frozen at a fixed time of day
pub struct FixedClock(pub NaiveTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveTime {
        self.0
    }
}

/// Daemon wired to recording doubles
pub fn test_daemon(
    synth: &Arc<RecordingSynthesizer>,
    opener: &Arc<RecordingOpener>,
) -> Daemon {
    daemon_with_config(test_config(), synth, opener)
}

/// Daemon wired to recording doubles with an explicit config
pub fn daemon_with_config(
    config: Config,
    synth: &Arc<RecordingSynthesizer>,
    opener: &Arc<RecordingOpener>,
) -> Daemon {
    let synthesizer: Arc<dyn Synthesizer> = synth.clone();
    let resource_opener: Arc<dyn ResourceOpener> = opener.clone();
    Daemon::new(config, synthesizer, resource_opener)
}
