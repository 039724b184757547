//! Mock audio environment for testing and development.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Result;
use crate::traits::AudioEnvironment;

#[derive(Debug)]
struct EnvironmentInner {
    wired: AtomicBool,
    output_at_maximum: AtomicBool,
}

/// Mock audio environment.
///
/// Starts with both preconditions satisfied (headset plugged in, volume at
/// maximum); the paired [`MockEnvironmentHandle`] toggles them at any time,
/// including while a session is polling.
///
/// # Examples
///
/// ```
/// use audicard_reader::AudioEnvironment;
/// use audicard_reader::mock::MockEnvironment;
///
/// #[tokio::main]
/// async fn main() -> audicard_reader::Result<()> {
///     let (environment, control) = MockEnvironment::new();
///     assert!(environment.has_wired_connection().await?);
///
///     control.set_wired(false);
///     assert!(!environment.has_wired_connection().await?);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockEnvironment {
    inner: Arc<EnvironmentInner>,
}

impl MockEnvironment {
    /// Create a new mock environment and its control handle.
    pub fn new() -> (Self, MockEnvironmentHandle) {
        let inner = Arc::new(EnvironmentInner {
            wired: AtomicBool::new(true),
            output_at_maximum: AtomicBool::new(true),
        });

        let environment = Self {
            inner: Arc::clone(&inner),
        };
        let handle = MockEnvironmentHandle { inner };

        (environment, handle)
    }
}

impl Default for MockEnvironment {
    fn default() -> Self {
        Self::new().0
    }
}

impl AudioEnvironment for MockEnvironment {
    async fn has_wired_connection(&self) -> Result<bool> {
        Ok(self.inner.wired.load(Ordering::Acquire))
    }

    async fn is_output_at_maximum(&self) -> Result<bool> {
        Ok(self.inner.output_at_maximum.load(Ordering::Acquire))
    }
}

/// Control handle for a [`MockEnvironment`].
#[derive(Debug, Clone)]
pub struct MockEnvironmentHandle {
    inner: Arc<EnvironmentInner>,
}

impl MockEnvironmentHandle {
    /// Plug or unplug the wired device.
    pub fn set_wired(&self, plugged: bool) {
        self.inner.wired.store(plugged, Ordering::Release);
    }

    /// Set whether the media volume sits at its maximum.
    pub fn set_output_at_maximum(&self, at_maximum: bool) {
        self.inner
            .output_at_maximum
            .store(at_maximum, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_satisfy_preconditions() {
        let (environment, _control) = MockEnvironment::new();
        assert!(environment.has_wired_connection().await.unwrap());
        assert!(environment.is_output_at_maximum().await.unwrap());
    }

    #[tokio::test]
    async fn test_toggles_are_visible_through_clones() {
        let (environment, control) = MockEnvironment::new();
        let observer = environment.clone();

        control.set_wired(false);
        control.set_output_at_maximum(false);

        assert!(!observer.has_wired_connection().await.unwrap());
        assert!(!observer.is_output_at_maximum().await.unwrap());

        control.set_wired(true);
        assert!(observer.has_wired_connection().await.unwrap());
    }
}
