//! Double-reset power-up handshake.
//!
//! The reader's first reset after power-up is not reliable: it must be put
//! back to sleep, left alone for a settle delay, and reset a second time
//! before polling can start. The sequencer here drives that dance off the
//! driver's notification stream:
//!
//! 1. issue `start()` then `reset()`;
//! 2. on the first `ResetComplete`: `sleep()`, wait the settle delay, issue
//!    `reset()` again;
//! 3. on the next `ResetComplete`: done.
//!
//! Only one delayed reset is ever in flight. Notifications that arrive while
//! the settle delay is pending are duplicates of the first completion — the
//! second reset does not exist yet, so nothing can have completed it — and
//! are drained before it is issued. One attempt per read request; the whole
//! sequence is bounded by a timeout so a dead reader fails instead of
//! hanging.

use std::time::Duration;

use audicard_reader::{AnyReaderPort, ReaderError, ReaderEvent, ReaderPort};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::SessionConfig;
use crate::state::{self, SessionState, SharedState};

/// Why a handshake attempt ended without completing.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The session was stopped while the handshake was running.
    #[error("handshake cancelled before completion")]
    Cancelled,

    /// No reset completion arrived within the configured window.
    #[error("no reset completion within {0:?}")]
    TimedOut(Duration),

    /// The driver notification stream closed.
    #[error("reader event stream closed")]
    ChannelClosed,

    /// A port command failed.
    #[error(transparent)]
    Port(#[from] ReaderError),
}

/// Sequencer for the double-reset handshake.
pub struct ResetHandshake {
    settle_delay: Duration,
    timeout: Duration,
}

#[derive(Clone, Copy)]
enum Phase {
    AwaitingFirst,
    AwaitingSecond,
}

impl ResetHandshake {
    /// Create a sequencer with the session's settle delay and timeout.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            settle_delay: config.settle_delay,
            timeout: config.handshake_timeout,
        }
    }

    /// Run one handshake attempt to completion.
    ///
    /// On success the reader is in a reliably pollable state and the next
    /// notifications on `events` belong to the polling phase.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake is cancelled, times out, loses the
    /// event stream, or a port command fails. The caller owns teardown.
    pub async fn run(
        &self,
        port: &mut AnyReaderPort,
        events: &mut mpsc::Receiver<ReaderEvent>,
        state: &SharedState,
        cancel: &CancellationToken,
    ) -> Result<(), HandshakeError> {
        port.start().await?;
        port.reset().await?;

        let deadline = tokio::time::Instant::now() + self.timeout;
        let mut phase = Phase::AwaitingFirst;

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => return Err(HandshakeError::Cancelled),
                received = tokio::time::timeout_at(deadline, events.recv()) => {
                    match received {
                        Err(_) => return Err(HandshakeError::TimedOut(self.timeout)),
                        Ok(None) => return Err(HandshakeError::ChannelClosed),
                        Ok(Some(event)) => event,
                    }
                }
            };

            match (phase, event) {
                // A response APDU during the handshake belongs to no poll;
                // skip it.
                (_, ReaderEvent::ResponseApdu(_)) => continue,

                (Phase::AwaitingFirst, ReaderEvent::ResetComplete) => {
                    debug!("first reset complete, scheduling second reset");
                    port.sleep().await?;

                    tokio::select! {
                        _ = cancel.cancelled() => return Err(HandshakeError::Cancelled),
                        _ = tokio::time::sleep(self.settle_delay) => {}
                    }

                    // Anything queued during the settle window predates the
                    // second reset and cannot be its completion.
                    while let Ok(stale) = events.try_recv() {
                        debug!(?stale, "discarding notification from settle window");
                    }

                    port.reset().await?;
                    state::advance(state, SessionState::AwaitingSecondReset);
                    phase = Phase::AwaitingSecond;
                }

                (Phase::AwaitingSecond, ReaderEvent::ResetComplete) => {
                    debug!("second reset complete, reader ready");
                    return Ok(());
                }
            }
        }
    }
}
