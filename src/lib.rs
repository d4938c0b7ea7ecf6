//! Navix - voice command assistant
//!
//! Turns a recognized utterance into exactly one intent and carries it out:
//! - Voice selection from the synthesizer catalog
//! - Ordered rule-table intent resolution with parameter extraction
//! - Dispatch to spoken confirmations and URL opening
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   transcript   ┌──────────────┐   intent   ┌──────────────┐
//! │  Recognizer  │ ─────────────▶ │    Intent    │ ─────────▶ │  Dispatcher  │
//! │ (stt, lines) │                │   resolver   │            │              │
//! └──────────────┘                └──────────────┘            └──────┬───────┘
//!                                                                    │
//!                                     ┌──────────────────────────────┼──────────┐
//!                                     ▼                              ▼          │
//!                              ┌─────────────┐ selected voice ┌─────────────┐   │
//!                              │ Synthesizer │ ◀───────────── │   Voice     │   │
//!                              │ (espeak-ng) │                │  selector   │   │
//!                              └─────────────┘                └─────────────┘   │
//!                                                             ┌─────────────┐   │
//!                                                             │   Opener    │ ◀─┘
//!                                                             │ (xdg-open)  │
//!                                                             └─────────────┘
//! ```

pub mod config;
pub mod daemon;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod opener;
pub mod session;
pub mod voice;

pub use config::Config;
pub use daemon::{Daemon, SessionReport};
pub use dispatch::{Clock, DispatchPlan, Dispatcher, Prosody, SystemClock};
pub use error::{Error, Result};
pub use intent::{Destination, Intent, IntentKind, SearchEngine, Transcript, resolve};
pub use opener::{OpenRequest, ResourceOpener};
pub use session::{ListeningSession, SessionEvent, SessionState, StatusSignal};
pub use voice::{
    RecognitionOutcome, Recognizer, SelectedVoice, SpeechRequest, Synthesizer, Voice,
    VoiceSelector,
};
