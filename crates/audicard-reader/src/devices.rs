//! Enum wrappers for reader device dispatch.
//!
//! Native `async fn` in traits (RPITIT) is not object-safe, so the port and
//! environment cannot be boxed as trait objects. These enums provide concrete
//! dispatch instead: zero-cost at runtime, extensible through feature-gated
//! variants when a real audio-jack transport lands.

use std::time::Duration;

use audicard_core::CardType;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::events::ReaderEvent;
use crate::mock::{MockEnvironment, MockReaderPort};
use crate::traits::{AudioEnvironment, ReaderPort};

/// Enum wrapper for reader-port dispatch.
///
/// # Examples
///
/// ```
/// use audicard_reader::{AnyReaderPort, ReaderPort};
/// use audicard_reader::mock::MockReaderPort;
///
/// #[tokio::main]
/// async fn main() -> audicard_reader::Result<()> {
///     let (port, _reader) = MockReaderPort::new();
///     let mut port = AnyReaderPort::Mock(port);
///     port.start().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyReaderPort {
    /// Mock port for development and testing.
    Mock(MockReaderPort),
    // A real audio-jack transport plugs in here behind `hardware-audiojack`.
}

impl ReaderPort for AnyReaderPort {
    async fn start(&mut self) -> Result<()> {
        match self {
            Self::Mock(port) => port.start().await,
        }
    }

    async fn reset(&mut self) -> Result<()> {
        match self {
            Self::Mock(port) => port.reset().await,
        }
    }

    async fn sleep(&mut self) -> Result<()> {
        match self {
            Self::Mock(port) => port.sleep().await,
        }
    }

    async fn stop(&mut self) -> Result<()> {
        match self {
            Self::Mock(port) => port.stop().await,
        }
    }

    async fn picc_power_on(&mut self, timeout: Duration, card_type: CardType) -> Result<()> {
        match self {
            Self::Mock(port) => port.picc_power_on(timeout, card_type).await,
        }
    }

    async fn picc_transmit(&mut self, timeout: Duration, apdu: &[u8]) -> Result<()> {
        match self {
            Self::Mock(port) => port.picc_transmit(timeout, apdu).await,
        }
    }

    async fn picc_power_off(&mut self) -> Result<()> {
        match self {
            Self::Mock(port) => port.picc_power_off().await,
        }
    }

    fn subscribe(&mut self) -> mpsc::Receiver<ReaderEvent> {
        match self {
            Self::Mock(port) => port.subscribe(),
        }
    }
}

/// Enum wrapper for audio-environment dispatch.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyAudioEnvironment {
    /// Mock environment for development and testing.
    Mock(MockEnvironment),
    // The platform audio service plugs in here behind `hardware-audiojack`.
}

impl AudioEnvironment for AnyAudioEnvironment {
    async fn has_wired_connection(&self) -> Result<bool> {
        match self {
            Self::Mock(environment) => environment.has_wired_connection().await,
        }
    }

    async fn is_output_at_maximum(&self) -> Result<bool> {
        match self {
            Self::Mock(environment) => environment.is_output_at_maximum().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_port_dispatch_journals_through_wrapper() {
        let (port, reader) = MockReaderPort::new();
        let mut port = AnyReaderPort::Mock(port);

        port.start().await.unwrap();
        port.stop().await.unwrap();

        assert_eq!(reader.ops().len(), 2);
    }

    #[tokio::test]
    async fn test_environment_dispatch() {
        let (environment, control) = MockEnvironment::new();
        let environment = AnyAudioEnvironment::Mock(environment);

        assert!(environment.has_wired_connection().await.unwrap());
        control.set_wired(false);
        assert!(!environment.has_wired_connection().await.unwrap());
    }
}
