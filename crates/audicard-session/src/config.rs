//! Session timing and capacity configuration.

use std::time::Duration;

use audicard_core::constants::{
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_RESPONSE_TIMEOUT,
    DEFAULT_SETTLE_DELAY, MISSED_CYCLE_THRESHOLD, SINK_CHANNEL_CAPACITY,
};
use audicard_core::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a read session.
///
/// The defaults reproduce the reader's reference timing: one-second cadence,
/// one-second settle delay inside the handshake, and a disconnect declared
/// after four silent cycles. Disconnect-detection latency is
/// `missed_cycle_threshold × poll_interval`; the threshold counts cycles, so
/// changing the cadence changes the latency.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use audicard_session::config::SessionConfig;
///
/// let config = SessionConfig {
///     poll_interval: Duration::from_millis(500),
///     ..SessionConfig::default()
/// };
/// assert_eq!(config.missed_cycle_threshold, 4);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Interval between poll attempts. The first poll waits one full
    /// interval after the session starts (stabilization delay).
    pub poll_interval: Duration,

    /// Consecutive responseless cycles after which the reader is declared
    /// disconnected.
    pub missed_cycle_threshold: u32,

    /// Pause between the sleep and the second reset of the power-up
    /// handshake.
    pub settle_delay: Duration,

    /// Upper bound on the whole handshake; exceeded means handshake failure.
    pub handshake_timeout: Duration,

    /// Time the reader is given to answer each PICC command.
    pub response_timeout: Duration,

    /// Buffer size of the result channel handed to the host.
    pub sink_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            missed_cycle_threshold: MISSED_CYCLE_THRESHOLD,
            settle_delay: DEFAULT_SETTLE_DELAY,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            sink_capacity: SINK_CHANNEL_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Check the configuration for values the session cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error if the poll interval is zero, the missed-cycle
    /// threshold is zero, or the sink capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::invalid_data("poll interval must be non-zero"));
        }
        if self.missed_cycle_threshold == 0 {
            return Err(Error::invalid_data(
                "missed cycle threshold must be at least 1",
            ));
        }
        if self.sink_capacity == 0 {
            return Err(Error::invalid_data("sink capacity must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.missed_cycle_threshold, 4);
        assert_eq!(config.settle_delay, Duration::from_secs(1));
        assert_eq!(config.response_timeout, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = SessionConfig {
            poll_interval: Duration::ZERO,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let config = SessionConfig {
            missed_cycle_threshold: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_sink_capacity() {
        let config = SessionConfig {
            sink_capacity: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let config = SessionConfig::default();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: SessionConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, config);
    }
}
