//! Trait definitions for the reader port and its environment.
//!
//! These traits establish the contract between the session lifecycle and the
//! audio-jack reader driver, enabling substitution between mock and real
//! hardware implementations.
//!
//! All traits use native `async fn` methods (edition 2024 RPITIT). They are
//! therefore not object-safe; use the enum wrappers in
//! [`devices`](crate::devices) where dynamic dispatch is needed.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use audicard_core::CardType;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::events::ReaderEvent;

/// Control surface of the audio-jack card reader.
///
/// The port is a single-owner resource: exactly one session may drive it at a
/// time. Commands are issued sequentially; responses to PICC transmits do not
/// come back from [`picc_transmit`](ReaderPort::picc_transmit) itself but
/// arrive asynchronously on the stream returned by
/// [`subscribe`](ReaderPort::subscribe).
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use audicard_core::CardType;
/// use audicard_reader::{ReaderPort, Result};
///
/// async fn poll_once<P: ReaderPort>(port: &mut P) -> Result<()> {
///     let timeout = Duration::from_secs(1);
///     port.picc_power_on(timeout, CardType::Auto).await?;
///     port.picc_transmit(timeout, &[0xFF, 0xCA, 0x00, 0x00, 0x00]).await?;
///     Ok(())
/// }
/// ```
pub trait ReaderPort: Send + Sync {
    /// Start the reader service on the audio interface.
    ///
    /// # Errors
    ///
    /// Returns an error if the audio transport cannot be opened.
    async fn start(&mut self) -> Result<()>;

    /// Reset the reader. Completion is signalled asynchronously with a
    /// [`ReaderEvent::ResetComplete`] notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be issued.
    async fn reset(&mut self) -> Result<()>;

    /// Put the reader into its low-power sleep state.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be issued.
    async fn sleep(&mut self) -> Result<()>;

    /// Stop the reader service and release the audio interface.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be issued.
    async fn stop(&mut self) -> Result<()>;

    /// Power on the contactless field for the given card technology.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be issued within `timeout`.
    async fn picc_power_on(&mut self, timeout: Duration, card_type: CardType) -> Result<()>;

    /// Transmit an APDU to the card in the field.
    ///
    /// Fire-and-forget from the caller's perspective: a card that answers
    /// produces a [`ReaderEvent::ResponseApdu`] notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be issued within `timeout`.
    async fn picc_transmit(&mut self, timeout: Duration, apdu: &[u8]) -> Result<()>;

    /// Power off the contactless field.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be issued.
    async fn picc_power_off(&mut self) -> Result<()>;

    /// Hand out the driver notification stream.
    ///
    /// The stream is single-consumer: a fresh subscription replaces any
    /// earlier one, and notifications raised while nobody is subscribed are
    /// dropped.
    fn subscribe(&mut self) -> mpsc::Receiver<ReaderEvent>;
}

/// Environmental preconditions of an audio-powered reader.
///
/// The reader draws power from the audio signal, so it only works with a
/// device physically plugged into the socket and the media volume at maximum.
/// Both checks are cheap and are re-evaluated on every poll cycle.
pub trait AudioEnvironment: Send + Sync {
    /// Whether a wired device is plugged into the audio socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform audio route cannot be queried.
    async fn has_wired_connection(&self) -> Result<bool>;

    /// Whether the media output volume is at its maximum level.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform volume cannot be queried.
    async fn is_output_at_maximum(&self) -> Result<bool>;
}
