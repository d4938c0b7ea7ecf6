//! Speech-to-text (STT) collaborators
//!
//! A [`Recognizer`] performs one listening attempt at a time and reports
//! exactly one terminal [`RecognitionOutcome`] for it.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

/// Terminal outcome of one listening attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    /// Best transcript of the utterance (first alternative only)
    Transcript(String),
    /// Recognition failed
    Error(String),
    /// Capture ended without a result
    Cancelled,
}

/// Speech recognition backend
#[async_trait]
pub trait Recognizer: Send {
    /// Capture one utterance and report how the attempt ended
    async fn listen(&mut self) -> RecognitionOutcome;

    /// Halt capture for the current attempt
    async fn stop(&mut self);
}

/// Treats each line of text input as one recognized utterance
///
/// End of input is reported as [`RecognitionOutcome::Cancelled`].
pub struct LineRecognizer<R> {
    reader: R,
    capturing: bool,
}

impl LineRecognizer<BufReader<Stdin>> {
    /// Read utterances from standard input
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LineRecognizer<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Read utterances from any buffered reader
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            capturing: false,
        }
    }

    #[cfg(test)]
    const fn is_capturing(&self) -> bool {
        self.capturing
    }
}

#[async_trait]
impl<R> Recognizer for LineRecognizer<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn listen(&mut self) -> RecognitionOutcome {
        self.capturing = true;
        let mut line = String::new();

        let outcome = match self.reader.read_line(&mut line).await {
            Ok(0) => RecognitionOutcome::Cancelled,
            Ok(_) => RecognitionOutcome::Transcript(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => RecognitionOutcome::Error(e.to_string()),
        };

        if !matches!(outcome, RecognitionOutcome::Transcript(_)) {
            self.capturing = false;
        }
        outcome
    }

    async fn stop(&mut self) {
        if self.capturing {
            tracing::trace!("capture stopped");
        }
        self.capturing = false;
    }
}
