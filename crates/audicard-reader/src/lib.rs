//! Reader-port abstraction for the audicard stack.
//!
//! This crate defines the trait surface between the session lifecycle and the
//! audio-jack reader driver, plus mock implementations for development and
//! testing. The real reader is driven over the device's audio interface; here
//! it is modelled as:
//!
//! - [`ReaderPort`](traits::ReaderPort): the control surface (`start`,
//!   `reset`, `sleep`, `stop`, and the PICC field commands) together with a
//!   [`subscribe`](traits::ReaderPort::subscribe) method handing out the
//!   stream of asynchronous driver notifications.
//! - [`AudioEnvironment`](traits::AudioEnvironment): the two environmental
//!   preconditions of an audio-powered reader — something plugged into the
//!   socket, and output volume at maximum.
//!
//! # Design Notes
//!
//! All device I/O uses native `async fn` in traits (edition 2024 RPITIT),
//! which are not object-safe; the [`devices`] module provides enum wrappers
//! (`AnyReaderPort`, `AnyAudioEnvironment`) for concrete dispatch, following
//! the same pattern used for feature-gated hardware backends.
//!
//! The driver's callback registration style ("on reset complete", "on
//! response APDU available") is reframed as an explicit event channel: the
//! consumer pulls [`ReaderEvent`](events::ReaderEvent)s from the receiver
//! returned by `subscribe()` instead of installing listeners on a shared
//! object graph.

pub mod devices;
pub mod error;
pub mod events;
pub mod mock;
pub mod traits;

pub use devices::{AnyAudioEnvironment, AnyReaderPort};
pub use error::{ReaderError, Result};
pub use events::ReaderEvent;
pub use traits::{AudioEnvironment, ReaderPort};
