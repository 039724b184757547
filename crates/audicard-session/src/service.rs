//! Host-facing reader service.
//!
//! [`ReaderService`] is the boundary a host application talks to: request a
//! read, stop it, observe results on the event channel. It owns the reader
//! port between sessions and lends it to exactly one session at a time,
//! reclaiming it when the session terminates.

use audicard_core::error::{Error, Result};
use audicard_core::types::{CardType, Command};
use audicard_reader::{
    AnyAudioEnvironment, AnyReaderPort, AudioEnvironment, ReaderEvent, ReaderPort,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::events::{FailureReason, ReadEvent};
use crate::handshake::{HandshakeError, ResetHandshake};
use crate::polling::{self, PollingSession};
use crate::state::{self, SessionState, SharedState, shared_state};

/// A session currently holding the reader.
struct ActiveSession {
    cancel: CancellationToken,
    task: JoinHandle<AnyReaderPort>,
}

/// Session lifecycle coordinator for one reader.
///
/// `begin_read` checks the audio preconditions up front — failures there are
/// returned immediately, before any command touches the reader — and then
/// runs the handshake and polling phases in the background. Everything that
/// happens after `begin_read` returns is reported on the event channel
/// handed out at construction: discovered card identifiers, or the session's
/// single terminal failure.
///
/// # Examples
///
/// ```no_run
/// use audicard_core::CardType;
/// use audicard_reader::{AnyAudioEnvironment, AnyReaderPort};
/// use audicard_reader::mock::{MockEnvironment, MockReaderPort};
/// use audicard_session::config::SessionConfig;
/// use audicard_session::service::ReaderService;
///
/// # async fn example() -> audicard_core::Result<()> {
/// let (port, reader) = MockReaderPort::new();
/// reader.set_auto_reset_complete(true);
/// let (environment, _env) = MockEnvironment::new();
///
/// let (mut service, mut events) = ReaderService::new(
///     AnyReaderPort::Mock(port),
///     AnyAudioEnvironment::Mock(environment),
///     SessionConfig::default(),
/// )?;
///
/// service.begin_read(CardType::Auto).await?;
/// let event = events.recv().await;
/// service.stop_read().await?;
/// # Ok(())
/// # }
/// ```
pub struct ReaderService {
    /// The port, present whenever no session holds it.
    port: Option<AnyReaderPort>,
    environment: AnyAudioEnvironment,
    config: SessionConfig,
    sink: mpsc::Sender<ReadEvent>,
    state: SharedState,
    active: Option<ActiveSession>,
}

impl ReaderService {
    /// Create a service owning the given port and environment.
    ///
    /// Returns the service together with the receiving end of the result
    /// channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        port: AnyReaderPort,
        environment: AnyAudioEnvironment,
        config: SessionConfig,
    ) -> Result<(Self, mpsc::Receiver<ReadEvent>)> {
        config.validate()?;
        let (sink, events) = mpsc::channel(config.sink_capacity);

        let service = Self {
            port: Some(port),
            environment,
            config,
            sink,
            state: shared_state(),
            active: None,
        };

        Ok((service, events))
    }

    /// Start a read session for the given card technology.
    ///
    /// Any session still holding the reader is terminated first and its
    /// teardown awaited — the port is never driven by two sessions at once.
    /// Returns as soon as the handshake is underway; handshake failures and
    /// everything later arrive on the event channel.
    ///
    /// # Errors
    ///
    /// Returns an error immediately — without issuing any reader command —
    /// if nothing is plugged into the audio socket or the output volume is
    /// below maximum. The caller corrects the condition and calls again.
    pub async fn begin_read(&mut self, card_type: CardType) -> Result<()> {
        self.stop_read().await?;

        if !self
            .environment
            .has_wired_connection()
            .await
            .map_err(|error| Error::unexpected(error.to_string()))?
        {
            return Err(Error::ReaderUnplugged);
        }
        if !self
            .environment
            .is_output_at_maximum()
            .await
            .map_err(|error| Error::unexpected(error.to_string()))?
        {
            return Err(Error::VolumeTooLow);
        }

        // The port is absent only if a previous session task panicked and
        // took it with it.
        let mut port = self
            .port
            .take()
            .ok_or_else(|| Error::unexpected("reader port unavailable"))?;
        if let Err(error) = state::transition(&self.state, SessionState::Initializing) {
            self.port = Some(port);
            return Err(error);
        }
        let events = port.subscribe();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_session(
            port,
            events,
            self.environment.clone(),
            Command::select_uid(self.config.response_timeout),
            card_type,
            self.config.clone(),
            self.sink.clone(),
            self.state.clone(),
            cancel.clone(),
        ));

        self.active = Some(ActiveSession { cancel, task });
        info!(%card_type, "read session started");
        Ok(())
    }

    /// Stop the active read session, if any, and await full teardown.
    ///
    /// Always resolves: without an active session this is a no-op, and a
    /// session that already terminated on its own is simply reaped.
    ///
    /// # Errors
    ///
    /// Returns an error if the session task panicked.
    pub async fn stop_read(&mut self) -> Result<()> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };

        active.cancel.cancel();
        match active.task.await {
            Ok(port) => {
                debug!("session torn down, reader port reclaimed");
                self.port = Some(port);
                Ok(())
            }
            Err(error) => Err(Error::unexpected(format!("session task failed: {error}"))),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        state::current_state(&self.state)
    }

    /// Whether a session currently holds the reader.
    pub fn is_reading(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.task.is_finished())
    }
}

/// Background pipeline for one read request: handshake, then polling.
#[allow(clippy::too_many_arguments)]
async fn run_session(
    mut port: AnyReaderPort,
    mut events: mpsc::Receiver<ReaderEvent>,
    environment: AnyAudioEnvironment,
    command: Command,
    card_type: CardType,
    config: SessionConfig,
    sink: mpsc::Sender<ReadEvent>,
    state: SharedState,
    cancel: CancellationToken,
) -> AnyReaderPort {
    let handshake = ResetHandshake::new(&config);
    match handshake.run(&mut port, &mut events, &state, &cancel).await {
        Ok(()) => {
            state::advance(&state, SessionState::PollingActive);
            info!("handshake complete, polling started");
            let session = PollingSession::new(
                port, events, environment, command, card_type, config, sink, state, cancel,
            );
            session.run().await
        }
        Err(HandshakeError::Cancelled) => {
            debug!("handshake cancelled by stop request");
            state::advance(&state, SessionState::Terminating);
            polling::shutdown(&mut port).await;
            state::advance(&state, SessionState::Terminated);
            port
        }
        Err(error) => {
            warn!(%error, "handshake failed");
            state::advance(&state, SessionState::Terminating);
            polling::shutdown(&mut port).await;
            state::advance(&state, SessionState::Terminated);
            let _ = sink
                .send(ReadEvent::Failed(FailureReason::Handshake {
                    message: error.to_string(),
                }))
                .await;
            port
        }
    }
}
