//! Cadence polling loop and session handle.
//!
//! A [`PollingSession`] owns the reader port for its lifetime and runs two
//! concurrent activities:
//!
//! - the **cadence loop**, which once per interval evaluates connection
//!   health, re-checks the audio preconditions, and fires the power-on +
//!   transmit pair; and
//! - the **response listener**, which consumes driver notifications, feeds
//!   the health monitor, filters the no-card status word, and emits card
//!   identifiers to the sink.
//!
//! The first poll happens one full interval after start (the reader needs the
//! same stabilization time it needs between polls). Stopping is cooperative:
//! the loop observes cancellation within one cadence interval, and an issued
//! power-on/transmit pair is never interrupted mid-flight. On every exit path
//! the shutdown sequence — power off the field, sleep the reader, stop the
//! service — runs exactly once before the session reaches `Terminated` and
//! the port is handed back.

use audicard_core::types::{CardIdentifier, CardType, Command, is_no_card_sentinel};
use audicard_reader::{
    AnyAudioEnvironment, AnyReaderPort, AudioEnvironment, ReaderEvent, ReaderPort,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::events::{FailureReason, ReadEvent};
use crate::health::{ConnectionHealth, HealthVerdict, ResponseMonitor};
use crate::state::{self, SessionState, SharedState};

/// A polling session over an acquired, handshaken reader.
///
/// Constructed once the handshake completes. [`start`] launches the session
/// on its own task and returns immediately; [`run`] drives it on the current
/// task.
///
/// [`start`]: PollingSession::start
/// [`run`]: PollingSession::run
pub struct PollingSession {
    port: AnyReaderPort,
    events: mpsc::Receiver<ReaderEvent>,
    environment: AnyAudioEnvironment,
    command: Command,
    card_type: CardType,
    config: SessionConfig,
    sink: mpsc::Sender<ReadEvent>,
    state: SharedState,
    cancel: CancellationToken,
}

impl PollingSession {
    /// Assemble a session from its parts.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        port: AnyReaderPort,
        events: mpsc::Receiver<ReaderEvent>,
        environment: AnyAudioEnvironment,
        command: Command,
        card_type: CardType,
        config: SessionConfig,
        sink: mpsc::Sender<ReadEvent>,
        state: SharedState,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            port,
            events,
            environment,
            command,
            card_type,
            config,
            sink,
            state,
            cancel,
        }
    }

    /// Launch the session on a dedicated task.
    ///
    /// Non-blocking; the returned handle requests termination and reclaims
    /// the port.
    pub fn start(self) -> SessionHandle {
        let cancel = self.cancel.clone();
        let runner = tokio::spawn(self.run());
        SessionHandle { cancel, runner }
    }

    /// Drive the session to completion, returning the port after teardown.
    ///
    /// Spawns the response listener, runs the cadence loop until cancellation
    /// or a failure check fires, then performs the shutdown sequence,
    /// transitions to `Terminated`, and reports at most one terminal failure
    /// on the sink.
    pub async fn run(self) -> AnyReaderPort {
        let Self {
            mut port,
            events,
            environment,
            command,
            card_type,
            config,
            sink,
            state,
            cancel,
        } = self;

        let mut health = ConnectionHealth::new(config.missed_cycle_threshold);
        let listener = tokio::spawn(response_listener(
            events,
            health.monitor(),
            sink.clone(),
            cancel.clone(),
        ));

        // First tick one full interval out: stabilization delay.
        let mut ticker = interval_at(Instant::now() + config.poll_interval, config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut failure: Option<FailureReason> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match health.evaluate() {
                HealthVerdict::Responsive => {}
                HealthVerdict::Missed(count) => {
                    debug!(missed_cycles = count, "no reader response since last cycle");
                }
                HealthVerdict::Disconnected(count) => {
                    failure = Some(FailureReason::DeviceDisconnected {
                        missed_cycles: count,
                    });
                    break;
                }
            }

            match environment.has_wired_connection().await {
                Ok(true) => {}
                Ok(false) => {
                    failure = Some(FailureReason::ReaderUnplugged);
                    break;
                }
                Err(error) => {
                    failure = Some(FailureReason::Unexpected {
                        message: error.to_string(),
                    });
                    break;
                }
            }

            match environment.is_output_at_maximum().await {
                Ok(true) => {}
                Ok(false) => {
                    failure = Some(FailureReason::VolumeTooLow);
                    break;
                }
                Err(error) => {
                    failure = Some(FailureReason::Unexpected {
                        message: error.to_string(),
                    });
                    break;
                }
            }

            trace!("polling for card");
            if let Err(error) = port
                .picc_power_on(command.response_timeout(), card_type)
                .await
            {
                failure = Some(FailureReason::Unexpected {
                    message: error.to_string(),
                });
                break;
            }
            if let Err(error) = port
                .picc_transmit(command.response_timeout(), command.apdu())
                .await
            {
                failure = Some(FailureReason::Unexpected {
                    message: error.to_string(),
                });
                break;
            }
            // The response, if any, arrives on the listener before the next
            // cycle's health check.
        }

        state::advance(&state, SessionState::Terminating);
        shutdown(&mut port).await;

        // Quiesce the listener before declaring the session terminated.
        cancel.cancel();
        if let Err(error) = listener.await {
            warn!(%error, "response listener task failed");
        }

        state::advance(&state, SessionState::Terminated);

        match failure {
            Some(reason) => {
                info!(%reason, "read session failed");
                let _ = sink.send(ReadEvent::Failed(reason)).await;
            }
            None => info!("read session stopped"),
        }

        port
    }
}

/// Handle to a running polling session.
pub struct SessionHandle {
    cancel: CancellationToken,
    runner: JoinHandle<AnyReaderPort>,
}

impl SessionHandle {
    /// Request cooperative termination.
    ///
    /// Idempotent, non-blocking, safe from any context and at any time —
    /// before the first cycle, after self-termination, repeatedly. The loop
    /// observes the request within one cadence interval; actual teardown
    /// happens on the session's own task.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the session has fully terminated.
    pub fn is_finished(&self) -> bool {
        self.runner.is_finished()
    }

    /// Stop the session, await full teardown, and reclaim the port.
    ///
    /// # Errors
    ///
    /// Returns an error if the session task panicked; the port is lost in
    /// that case.
    pub async fn into_port(self) -> audicard_core::Result<AnyReaderPort> {
        self.cancel.cancel();
        self.runner.await.map_err(|error| {
            audicard_core::Error::unexpected(format!("session task failed: {error}"))
        })
    }
}

/// Consume driver notifications for the lifetime of the session.
async fn response_listener(
    mut events: mpsc::Receiver<ReaderEvent>,
    monitor: ResponseMonitor,
    sink: mpsc::Sender<ReadEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            ReaderEvent::ResetComplete => {
                debug!("ignoring reset completion outside the handshake");
            }
            ReaderEvent::ResponseApdu(response) => {
                // Any answer proves the reader alive, the no-card status
                // word included.
                monitor.mark_responded();

                if is_no_card_sentinel(&response) {
                    trace!("no card in field");
                    continue;
                }

                match CardIdentifier::from_response(&response) {
                    Ok(card) => {
                        debug!(uid = %card.hex(), "card discovered");
                        if sink.send(ReadEvent::Card(card)).await.is_err() {
                            break;
                        }
                    }
                    Err(error) => warn!(%error, "discarding malformed card response"),
                }
            }
        }
    }
}

/// Mandatory shutdown sequence: field off, reader asleep, service stopped.
///
/// Runs to completion even if individual steps fail; the reader must never be
/// left with the field powered or awake.
pub(crate) async fn shutdown(port: &mut AnyReaderPort) {
    if let Err(error) = port.picc_power_off().await {
        warn!(%error, "power off failed during shutdown");
    }
    if let Err(error) = port.sleep().await {
        warn!(%error, "sleep failed during shutdown");
    }
    if let Err(error) = port.stop().await {
        warn!(%error, "stop failed during shutdown");
    }
}
