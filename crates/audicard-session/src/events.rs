//! Events delivered on the result sink.

use std::fmt;

use audicard_core::error::Error;
use audicard_core::types::CardIdentifier;
use serde::Serialize;

/// Reason a read session terminated without being stopped explicitly.
///
/// At most one failure is reported per session; after it is delivered the
/// reader has already been powered off and put to sleep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The double-reset power-up handshake did not complete.
    Handshake { message: String },

    /// The reader stopped answering polls for the configured number of
    /// consecutive cycles.
    DeviceDisconnected { missed_cycles: u32 },

    /// Nothing is plugged into the audio socket.
    ReaderUnplugged,

    /// The media output volume dropped below maximum.
    VolumeTooLow,

    /// Any other driver failure, with the cause preserved.
    Unexpected { message: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handshake { message } => write!(f, "handshake failed: {message}"),
            Self::DeviceDisconnected { missed_cycles } => {
                write!(f, "device disconnected after {missed_cycles} silent cycles")
            }
            Self::ReaderUnplugged => write!(f, "reader unplugged"),
            Self::VolumeTooLow => write!(f, "volume too low"),
            Self::Unexpected { message } => write!(f, "unexpected failure: {message}"),
        }
    }
}

impl From<FailureReason> for Error {
    fn from(reason: FailureReason) -> Self {
        match reason {
            FailureReason::Handshake { message } => Error::HandshakeFailed { message },
            FailureReason::DeviceDisconnected { missed_cycles } => {
                Error::DeviceDisconnected { missed_cycles }
            }
            FailureReason::ReaderUnplugged => Error::ReaderUnplugged,
            FailureReason::VolumeTooLow => Error::VolumeTooLow,
            FailureReason::Unexpected { message } => Error::Unexpected { message },
        }
    }
}

/// Event emitted by a read session.
///
/// A card that stays in the field keeps answering every poll cycle and is
/// re-emitted each time; de-duplication, if wanted, is the host's call. A
/// `Failed` event is terminal for the session.
#[derive(Debug, Clone, Serialize)]
pub enum ReadEvent {
    /// A card answered the select command.
    Card(CardIdentifier),

    /// The session terminated with a failure.
    Failed(FailureReason),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_display() {
        assert_eq!(
            FailureReason::ReaderUnplugged.to_string(),
            "reader unplugged"
        );
        assert_eq!(FailureReason::VolumeTooLow.to_string(), "volume too low");
        assert_eq!(
            FailureReason::DeviceDisconnected { missed_cycles: 4 }.to_string(),
            "device disconnected after 4 silent cycles"
        );
    }

    #[test]
    fn test_failure_reason_into_error() {
        let error: Error = FailureReason::DeviceDisconnected { missed_cycles: 4 }.into();
        assert!(matches!(
            error,
            Error::DeviceDisconnected { missed_cycles: 4 }
        ));

        let error: Error = FailureReason::Handshake {
            message: "timed out".to_string(),
        }
        .into();
        assert!(matches!(error, Error::HandshakeFailed { .. }));
    }

    #[test]
    fn test_failure_reason_serde() {
        let serialized =
            serde_json::to_string(&FailureReason::DeviceDisconnected { missed_cycles: 4 }).unwrap();
        assert!(serialized.contains("device_disconnected"));
        assert!(serialized.contains("4"));
    }
}
