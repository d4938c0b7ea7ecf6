//! Daemon - the assistant loop
//!
//! Orchestrates voice selection, greeting, recognition, intent resolution and
//! dispatch for one listening session at a time

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::dispatch::{Clock, DispatchPlan, Dispatcher, Prosody, RECOGNITION_ERROR_PHRASE};
use crate::intent::{Intent, Transcript, resolve};
use crate::opener::{self, ResourceOpener};
use crate::session::{ListeningSession, SessionEvent, StatusSignal, Transition};
use crate::voice::{self, RecognitionOutcome, Recognizer, Synthesizer, Voice, VoiceSelector};
use crate::{Config, Result};

/// Capacity of the status signal channel
const SIGNAL_CAPACITY: usize = 16;

/// How a listening session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionReport {
    /// A transcript was resolved and dispatched
    Dispatched {
        /// Normalized transcript
        transcript: Transcript,
        /// Resolved intent
        intent: Intent,
        /// What was spoken and opened
        plan: DispatchPlan,
    },
    /// The recognizer reported an error; an apology was spoken
    RecognitionFailed {
        /// Recognizer error message
        message: String,
    },
    /// Capture ended without a result
    Cancelled,
}

/// The Navix daemon
pub struct Daemon {
    config: Config,
    synthesizer: Arc<dyn Synthesizer>,
    selector: VoiceSelector,
    dispatcher: Dispatcher,
    signals: broadcast::Sender<StatusSignal>,
}

impl Daemon {
    /// Create a daemon with explicit collaborators
    pub fn new(
        config: Config,
        synthesizer: Arc<dyn Synthesizer>,
        opener: Arc<dyn ResourceOpener>,
    ) -> Self {
        let selector = VoiceSelector::new(&config.voice);
        let dispatcher = Dispatcher::new(
            Arc::clone(&synthesizer),
            opener,
            selector.selected(),
            Prosody {
                pitch: config.voice.pitch,
                rate: config.voice.rate,
            },
            config.recognition.locale.clone(),
        );
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);

        Self {
            config,
            synthesizer,
            selector,
            dispatcher,
            signals,
        }
    }

    /// Create a daemon with the collaborators named in `config`
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        let synthesizer: Arc<dyn Synthesizer> = voice::synthesizer_from_config(&config.voice).into();
        let opener: Arc<dyn ResourceOpener> = opener::from_config(&config.opener).into();
        tracing::debug!(
            synthesizer = synthesizer.id(),
            opener = opener.id(),
            "collaborators ready"
        );
        Self::new(config, synthesizer, opener)
    }

    /// Replace the clock used for time queries
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.dispatcher = self.dispatcher.with_clock(clock);
        self
    }

    /// Subscribe to listening status signals
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StatusSignal> {
        self.signals.subscribe()
    }

    /// The dispatcher, for one-off utterances and planning
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The voice selector
    #[must_use]
    pub const fn selector(&self) -> &VoiceSelector {
        &self.selector
    }

    /// Greeting spoken at the start of every session
    #[must_use]
    pub fn greeting(&self) -> String {
        format!("Hello, I am {}. How may I assist you?", self.config.name)
    }

    /// Fetch the synthesizer catalog and reselect the voice
    ///
    /// Safe to call again whenever the catalog may have changed.
    pub async fn load_voices(&self) -> Option<Voice> {
        match self.synthesizer.voices().await {
            Ok(catalog) => {
                tracing::debug!(count = catalog.len(), "voice catalog available");
                self.selector.on_catalog(&catalog)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load voice catalog");
                self.selector.on_catalog(&[])
            }
        }
    }

    fn publish(&self, transition: Transition) {
        if let Some(signal) = transition.signal {
            publish_signal(&self.signals, signal);
        }
    }

    /// Run one listening session: greet, pause, capture, resolve, dispatch
    ///
    /// The pre-listening delay runs from the start of the greeting; capture
    /// begins once both have finished. If the returned future is dropped
    /// mid-capture, `ListeningEnded` is still published.
    ///
    /// # Errors
    ///
    /// Returns `Error::Session` only if the session is driven out of order,
    /// which indicates a bug; collaborator failures are absorbed
    pub async fn run_session<R>(&self, recognizer: &mut R) -> Result<SessionReport>
    where
        R: Recognizer + ?Sized,
    {
        let mut guard = SessionGuard {
            session: ListeningSession::new(),
            signals: &self.signals,
        };

        self.publish(guard.session.advance(SessionEvent::Activated)?);
        let greeting = self.greeting();
        tokio::join!(
            self.dispatcher.say(&greeting),
            tokio::time::sleep(self.config.recognition.listen_delay),
        );
        self.publish(guard.session.advance(SessionEvent::DelayElapsed)?);
        tracing::info!("listening");

        match recognizer.listen().await {
            RecognitionOutcome::Transcript(raw) => {
                recognizer.stop().await;
                let (transcript, transition) = guard.session.accept_result(&raw)?;
                self.publish(transition);
                tracing::info!(%transcript, "command received");

                let intent = resolve(&transcript);
                let plan = match self.dispatcher.dispatch(&transcript, &intent).await {
                    Ok(plan) => plan,
                    Err(e) => {
                        tracing::warn!(error = %e, "dispatch incomplete");
                        self.dispatcher.plan(&transcript, &intent)
                    }
                };

                self.publish(guard.session.advance(SessionEvent::Dispatched)?);
                Ok(SessionReport::Dispatched {
                    transcript,
                    intent,
                    plan,
                })
            }
            RecognitionOutcome::Error(message) => {
                self.publish(guard.session.advance(SessionEvent::Error)?);
                tracing::error!(error = %message, "speech recognition error");
                self.dispatcher.say(RECOGNITION_ERROR_PHRASE).await;
                Ok(SessionReport::RecognitionFailed { message })
            }
            RecognitionOutcome::Cancelled => {
                self.publish(guard.session.advance(SessionEvent::Cancelled)?);
                tracing::info!("capture ended without a result");
                Ok(SessionReport::Cancelled)
            }
        }
    }

    /// Run sessions until input ends, `once` completes, or Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if a session is driven out of order
    pub async fn run<R>(&self, recognizer: &mut R, once: bool) -> Result<()>
    where
        R: Recognizer + ?Sized,
    {
        tracing::info!(name = %self.config.name, "assistant ready");
        self.load_voices().await;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                report = self.run_session(recognizer) => {
                    let report = report?;
                    if once || report == SessionReport::Cancelled {
                        break;
                    }
                }
            }
        }

        tracing::info!("daemon stopped");
        Ok(())
    }
}

fn publish_signal(signals: &broadcast::Sender<StatusSignal>, signal: StatusSignal) {
    tracing::debug!(%signal, "status");
    // No subscribers is fine
    let _ = signals.send(signal);
}

/// Session owned by a running [`Daemon::run_session`]
///
/// Resets on drop so an interrupted capture still reports `ListeningEnded`.
struct SessionGuard<'a> {
    session: ListeningSession,
    signals: &'a broadcast::Sender<StatusSignal>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if let Some(signal) = self.session.reset() {
            tracing::info!("session interrupted");
            publish_signal(self.signals, signal);
        }
    }
}
