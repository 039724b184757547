//! Error types for reader-port operations.

use thiserror::Error;

/// Result type alias for reader-port operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors that can occur while driving the reader hardware.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// The reader service has not been started.
    #[error("reader service not started")]
    NotStarted,

    /// The reader is no longer reachable over the audio interface.
    #[error("reader detached: {message}")]
    Detached { message: String },

    /// A device command was issued but failed.
    #[error("reader command {command} failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Generic I/O error from the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    /// Create a new detached error.
    pub fn detached(message: impl Into<String>) -> Self {
        Self::Detached {
            message: message.into(),
        }
    }

    /// Create a new command failure error.
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }
}
