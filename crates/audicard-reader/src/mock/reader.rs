//! Mock reader port for testing and development.
//!
//! The mock journals every command issued on the port so tests can assert on
//! the exact command sequence (for example, that the shutdown sequence ran
//! exactly once), and exposes a control handle that plays the role of the
//! physical reader: completing resets and answering polls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use audicard_core::CardType;
use audicard_core::constants::EVENT_CHANNEL_CAPACITY;
use tokio::sync::mpsc;

use crate::error::{ReaderError, Result};
use crate::events::ReaderEvent;
use crate::traits::ReaderPort;

/// One journalled port command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortOp {
    /// `start()` was issued.
    Start,

    /// `reset()` was issued.
    Reset,

    /// `sleep()` was issued.
    Sleep,

    /// `stop()` was issued.
    Stop,

    /// `picc_power_on()` was issued for the given card technology.
    PowerOn { card_type: CardType },

    /// `picc_transmit()` was issued with the given payload.
    Transmit { apdu: Vec<u8> },

    /// `picc_power_off()` was issued.
    PowerOff,
}

impl PortOp {
    /// The kind of this operation, for counting.
    pub fn kind(&self) -> PortOpKind {
        match self {
            Self::Start => PortOpKind::Start,
            Self::Reset => PortOpKind::Reset,
            Self::Sleep => PortOpKind::Sleep,
            Self::Stop => PortOpKind::Stop,
            Self::PowerOn { .. } => PortOpKind::PowerOn,
            Self::Transmit { .. } => PortOpKind::Transmit,
            Self::PowerOff => PortOpKind::PowerOff,
        }
    }
}

/// Payload-free discriminant of [`PortOp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortOpKind {
    /// `start()`.
    Start,
    /// `reset()`.
    Reset,
    /// `sleep()`.
    Sleep,
    /// `stop()`.
    Stop,
    /// `picc_power_on()`.
    PowerOn,
    /// `picc_transmit()`.
    Transmit,
    /// `picc_power_off()`.
    PowerOff,
}

#[derive(Debug)]
struct MockReaderInner {
    /// Journal of every command issued on the port.
    ops: Mutex<Vec<PortOp>>,

    /// Sender side of the current subscription, if any.
    events: Mutex<Option<mpsc::Sender<ReaderEvent>>>,

    /// Errors to return from upcoming commands, oldest first.
    fail_queue: Mutex<VecDeque<ReaderError>>,

    /// Emit a `ResetComplete` notification whenever `reset()` is issued.
    auto_reset_complete: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock reader port for testing and development.
///
/// Created together with a [`MockReaderHandle`] that simulates the physical
/// reader.
///
/// # Examples
///
/// ```
/// use audicard_reader::ReaderPort;
/// use audicard_reader::mock::{MockReaderPort, PortOpKind};
///
/// #[tokio::main]
/// async fn main() -> audicard_reader::Result<()> {
///     let (mut port, reader) = MockReaderPort::new();
///     let mut events = port.subscribe();
///
///     port.start().await?;
///     port.reset().await?;
///     assert_eq!(reader.op_count(PortOpKind::Reset), 1);
///
///     // The "hardware" completes the reset.
///     reader.complete_reset().await?;
///     assert!(events.recv().await.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockReaderPort {
    inner: Arc<MockReaderInner>,
}

impl MockReaderPort {
    /// Create a new mock port and its control handle.
    ///
    /// Reset auto-completion starts disabled; tests that do not care about
    /// handshake details enable it with
    /// [`MockReaderHandle::set_auto_reset_complete`].
    pub fn new() -> (Self, MockReaderHandle) {
        let inner = Arc::new(MockReaderInner {
            ops: Mutex::new(Vec::new()),
            events: Mutex::new(None),
            fail_queue: Mutex::new(VecDeque::new()),
            auto_reset_complete: AtomicBool::new(false),
        });

        let port = Self {
            inner: Arc::clone(&inner),
        };
        let handle = MockReaderHandle { inner };

        (port, handle)
    }

    /// Journal a command, then fail it if an injected error is pending.
    fn record(&self, op: PortOp) -> Result<()> {
        lock(&self.inner.ops).push(op);
        if let Some(error) = lock(&self.inner.fail_queue).pop_front() {
            return Err(error);
        }
        Ok(())
    }

    /// Push a notification to the current subscriber, if any.
    fn notify(&self, event: ReaderEvent) {
        let sender = lock(&self.inner.events).clone();
        if let Some(sender) = sender {
            let _ = sender.try_send(event);
        }
    }
}

impl Default for MockReaderPort {
    fn default() -> Self {
        Self::new().0
    }
}

impl ReaderPort for MockReaderPort {
    async fn start(&mut self) -> Result<()> {
        self.record(PortOp::Start)
    }

    async fn reset(&mut self) -> Result<()> {
        self.record(PortOp::Reset)?;
        if self.inner.auto_reset_complete.load(Ordering::Acquire) {
            self.notify(ReaderEvent::ResetComplete);
        }
        Ok(())
    }

    async fn sleep(&mut self) -> Result<()> {
        self.record(PortOp::Sleep)
    }

    async fn stop(&mut self) -> Result<()> {
        self.record(PortOp::Stop)
    }

    async fn picc_power_on(&mut self, _timeout: Duration, card_type: CardType) -> Result<()> {
        self.record(PortOp::PowerOn { card_type })
    }

    async fn picc_transmit(&mut self, _timeout: Duration, apdu: &[u8]) -> Result<()> {
        self.record(PortOp::Transmit {
            apdu: apdu.to_vec(),
        })
    }

    async fn picc_power_off(&mut self) -> Result<()> {
        self.record(PortOp::PowerOff)
    }

    fn subscribe(&mut self) -> mpsc::Receiver<ReaderEvent> {
        let (sender, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        *lock(&self.inner.events) = Some(sender);
        receiver
    }
}

/// Control handle simulating the physical reader.
///
/// The handle injects driver notifications into the current subscription and
/// inspects the command journal. It can be cloned and moved into driver
/// tasks.
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    inner: Arc<MockReaderInner>,
}

impl MockReaderHandle {
    /// Emit a `ResetComplete` notification, as the hardware would after a
    /// reset finishes.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody is subscribed or the subscription was
    /// dropped.
    pub async fn complete_reset(&self) -> Result<()> {
        self.send(ReaderEvent::ResetComplete).await
    }

    /// Emit a response APDU, as the hardware would after a transmit reaches a
    /// card.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody is subscribed or the subscription was
    /// dropped.
    pub async fn respond(&self, response: Vec<u8>) -> Result<()> {
        self.send(ReaderEvent::ResponseApdu(response)).await
    }

    /// Automatically emit `ResetComplete` whenever `reset()` is issued.
    pub fn set_auto_reset_complete(&self, enabled: bool) {
        self.inner
            .auto_reset_complete
            .store(enabled, Ordering::Release);
    }

    /// Make the next port command fail with the given error.
    ///
    /// Queued errors are consumed in order, one per command. The failing
    /// command is still journalled.
    pub fn fail_next_command(&self, error: ReaderError) {
        lock(&self.inner.fail_queue).push_back(error);
    }

    /// Snapshot of the command journal, oldest first.
    pub fn ops(&self) -> Vec<PortOp> {
        lock(&self.inner.ops).clone()
    }

    /// Number of journalled commands of the given kind.
    pub fn op_count(&self, kind: PortOpKind) -> usize {
        lock(&self.inner.ops)
            .iter()
            .filter(|op| op.kind() == kind)
            .count()
    }

    /// Wait until at least `count` commands of the given kind have been
    /// journalled.
    ///
    /// Polls the journal; wrap in `tokio::time::timeout` when the count might
    /// never be reached.
    pub async fn wait_for_ops(&self, kind: PortOpKind, count: usize) {
        loop {
            if self.op_count(kind) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn send(&self, event: ReaderEvent) -> Result<()> {
        let sender = lock(&self.inner.events).clone();
        let Some(sender) = sender else {
            return Err(ReaderError::NotStarted);
        };
        sender
            .send(event)
            .await
            .map_err(|_| ReaderError::detached("event subscription dropped"))
    }
}
