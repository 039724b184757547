//! Connection-health tracking for the polling loop.
//!
//! Two facts describe the health of the reader link: whether it responded
//! since the last check, and how many consecutive cycles passed without any
//! response. The first is the only state shared between execution contexts —
//! the driver's notification handler sets it, the cadence loop consumes it —
//! so it lives in an atomic and the loop's read-then-reset is a single
//! `swap`. A response landing between two loop instructions can therefore
//! never be lost or counted twice. The missed-cycle counter is owned
//! exclusively by the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Producer-side view of the responded-since-last-check flag.
///
/// Cloned into whatever context delivers driver responses; cheap to clone and
/// safe to signal from any thread.
#[derive(Debug, Clone, Default)]
pub struct ResponseMonitor {
    responded: Arc<AtomicBool>,
}

impl ResponseMonitor {
    /// Create a monitor with the flag cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the reader produced a response.
    ///
    /// Called for every response APDU, including the no-card status word: any
    /// answer proves the reader is alive.
    pub fn mark_responded(&self) {
        self.responded.store(true, Ordering::Release);
    }

    /// Atomically read and clear the flag.
    ///
    /// This is the loop's once-per-cycle check-then-reset, collapsed into one
    /// operation.
    pub fn consume(&self) -> bool {
        self.responded.swap(false, Ordering::AcqRel)
    }
}

/// Verdict of one health evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthVerdict {
    /// The reader responded since the last check.
    Responsive,

    /// No response this cycle; count is still below the threshold.
    Missed(u32),

    /// The threshold of consecutive silent cycles was reached.
    Disconnected(u32),
}

/// Loop-owned health state: the shared flag plus the missed-cycle counter.
#[derive(Debug)]
pub struct ConnectionHealth {
    monitor: ResponseMonitor,
    missed_cycles: u32,
    threshold: u32,
}

impl ConnectionHealth {
    /// Create health state declaring a disconnect after `threshold`
    /// consecutive silent cycles.
    pub fn new(threshold: u32) -> Self {
        Self {
            monitor: ResponseMonitor::new(),
            missed_cycles: 0,
            threshold,
        }
    }

    /// Producer-side handle for the response flag.
    pub fn monitor(&self) -> ResponseMonitor {
        self.monitor.clone()
    }

    /// Evaluate the link once, at the top of a poll cycle.
    ///
    /// Consumes the response flag; a response resets the missed-cycle counter
    /// to zero, silence increments it. The counter counts cycles, not
    /// wall-clock time.
    pub fn evaluate(&mut self) -> HealthVerdict {
        if self.monitor.consume() {
            self.missed_cycles = 0;
            return HealthVerdict::Responsive;
        }

        self.missed_cycles += 1;
        if self.missed_cycles >= self.threshold {
            HealthVerdict::Disconnected(self.missed_cycles)
        } else {
            HealthVerdict::Missed(self.missed_cycles)
        }
    }

    /// Current consecutive missed-cycle count.
    pub fn missed_cycles(&self) -> u32 {
        self.missed_cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_reaches_threshold_on_exact_cycle() {
        let mut health = ConnectionHealth::new(4);

        assert_eq!(health.evaluate(), HealthVerdict::Missed(1));
        assert_eq!(health.evaluate(), HealthVerdict::Missed(2));
        assert_eq!(health.evaluate(), HealthVerdict::Missed(3));
        assert_eq!(health.evaluate(), HealthVerdict::Disconnected(4));
    }

    #[test]
    fn test_response_resets_counter() {
        let mut health = ConnectionHealth::new(4);
        let monitor = health.monitor();

        assert_eq!(health.evaluate(), HealthVerdict::Missed(1));
        assert_eq!(health.evaluate(), HealthVerdict::Missed(2));

        // Response during cycle k: counter is 0 entering cycle k+1 and 1
        // entering cycle k+2.
        monitor.mark_responded();
        assert_eq!(health.evaluate(), HealthVerdict::Responsive);
        assert_eq!(health.missed_cycles(), 0);
        assert_eq!(health.evaluate(), HealthVerdict::Missed(1));
    }

    #[test]
    fn test_consume_clears_flag() {
        let monitor = ResponseMonitor::new();
        monitor.mark_responded();

        assert!(monitor.consume());
        // Consumed: the same response is not seen twice.
        assert!(!monitor.consume());
    }

    #[test]
    fn test_multiple_responses_within_one_cycle_count_once() {
        let mut health = ConnectionHealth::new(4);
        let monitor = health.monitor();

        monitor.mark_responded();
        monitor.mark_responded();
        monitor.mark_responded();

        assert_eq!(health.evaluate(), HealthVerdict::Responsive);
        assert_eq!(health.evaluate(), HealthVerdict::Missed(1));
    }

    #[test]
    fn test_monitor_clones_share_the_flag() {
        let mut health = ConnectionHealth::new(4);
        let monitor = health.monitor();
        let remote = monitor.clone();

        let handle = std::thread::spawn(move || remote.mark_responded());
        handle.join().unwrap();

        assert_eq!(health.evaluate(), HealthVerdict::Responsive);
    }

    #[test]
    fn test_counter_does_not_accumulate_across_successes() {
        let mut health = ConnectionHealth::new(4);
        let monitor = health.monitor();

        for _ in 0..10 {
            assert!(matches!(
                health.evaluate(),
                HealthVerdict::Missed(_) | HealthVerdict::Responsive
            ));
            monitor.mark_responded();
            assert_eq!(health.evaluate(), HealthVerdict::Responsive);
        }
    }

    #[test]
    fn test_threshold_of_one_disconnects_immediately() {
        let mut health = ConnectionHealth::new(1);
        assert_eq!(health.evaluate(), HealthVerdict::Disconnected(1));
    }
}
