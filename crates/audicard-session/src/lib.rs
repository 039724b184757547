//! Session lifecycle for the audio-jack card reader.
//!
//! This crate coordinates the three phases of a card read:
//!
//! 1. **Handshake** — the reader's first reset after power-up is unreliable,
//!    so [`handshake`] drives a mandatory double-reset sequence (reset, sleep,
//!    settle, reset again) before any polling starts.
//! 2. **Polling** — [`polling::PollingSession`] commands the reader to power
//!    the contactless field and transmit the select command at a fixed
//!    cadence, watches the connection-health counter and the audio
//!    preconditions, and reports discovered card identifiers.
//! 3. **Teardown** — every exit path, explicit or failed, powers the field
//!    off and puts the reader to sleep before the session terminates.
//!
//! [`service::ReaderService`] is the host-facing boundary tying the phases
//! together: `begin_read` runs handshake and polling in the background,
//! `stop_read` requests cooperative termination and awaits full teardown, and
//! results arrive on an event channel.
//!
//! # Concurrency
//!
//! Two activities share the reader: the cadence loop and the driver's
//! asynchronous notifications. The only mutable state they share is the
//! responded-since-last-check flag, held in [`health::ResponseMonitor`] as an
//! atomic that the loop consumes-and-resets in a single operation. Everything
//! else is owned by exactly one task; the port itself moves into the session
//! and is handed back when it terminates.
//!
//! # Examples
//!
//! ```no_run
//! use audicard_core::CardType;
//! use audicard_reader::{AnyAudioEnvironment, AnyReaderPort};
//! use audicard_reader::mock::{MockEnvironment, MockReaderPort};
//! use audicard_session::config::SessionConfig;
//! use audicard_session::events::ReadEvent;
//! use audicard_session::service::ReaderService;
//!
//! #[tokio::main]
//! async fn main() -> audicard_core::Result<()> {
//!     let (port, reader) = MockReaderPort::new();
//!     reader.set_auto_reset_complete(true);
//!     let (environment, _env) = MockEnvironment::new();
//!
//!     let (mut service, mut events) = ReaderService::new(
//!         AnyReaderPort::Mock(port),
//!         AnyAudioEnvironment::Mock(environment),
//!         SessionConfig::default(),
//!     )?;
//!
//!     service.begin_read(CardType::Auto).await?;
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             ReadEvent::Card(card) => println!("card: {}", card.hex()),
//!             ReadEvent::Failed(reason) => {
//!                 eprintln!("read failed: {reason}");
//!                 break;
//!             }
//!         }
//!     }
//!     service.stop_read().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod events;
pub mod handshake;
pub mod health;
pub mod polling;
pub mod service;
pub mod state;

pub use config::SessionConfig;
pub use events::{FailureReason, ReadEvent};
pub use polling::{PollingSession, SessionHandle};
pub use service::ReaderService;
pub use state::SessionState;
