//! Error types for the audicard session stack.

use thiserror::Error;

/// Result type alias for audicard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the session lifecycle.
///
/// The first two variants are precondition failures: they are detected before
/// any command is issued to the reader and the caller is expected to correct
/// the condition and request a new read. The remaining variants cover failures
/// during or after setup.
#[derive(Debug, Error)]
pub enum Error {
    /// No device is plugged into the audio socket.
    #[error("reader is unplugged from the audio socket")]
    ReaderUnplugged,

    /// The media output volume is below maximum; the reader is powered by the
    /// audio signal and cannot operate reliably.
    #[error("media output volume is below maximum")]
    VolumeTooLow,

    /// The double-reset power-up handshake did not complete.
    #[error("reset handshake failed: {message}")]
    HandshakeFailed { message: String },

    /// The reader stopped answering polls.
    #[error("reader disconnected after {missed_cycles} poll cycles without a response")]
    DeviceDisconnected { missed_cycles: u32 },

    /// A session state change was requested that the lifecycle does not allow.
    #[error("invalid session state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Malformed data from the reader or an invalid configuration value.
    #[error("invalid data: {message}")]
    InvalidData { message: String },

    /// Any other driver failure, with the underlying cause preserved in the
    /// message.
    #[error("unexpected reader failure: {message}")]
    Unexpected { message: String },
}

impl Error {
    /// Create a new handshake failure error.
    pub fn handshake_failed(message: impl Into<String>) -> Self {
        Self::HandshakeFailed {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new unexpected failure error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }
}
