//! Error types for Navix

use thiserror::Error;

/// Result type alias for Navix operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Navix
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Voice catalog or selection error
    #[error("voice error: {0}")]
    Voice(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Failed to open a resource
    #[error("open error: {0}")]
    Open(String),

    /// Illegal listening session transition
    #[error("session error: {0}")]
    Session(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
