//! Observers for gate progress

use std::sync::Arc;
use std::time::Duration;

/// Receives progress notifications from [`NamedGate`](super::NamedGate)
///
/// Every method defaults to a no-op, so implementors only override the
/// notifications they care about. Observers must not panic.
pub trait GateObserver: Send + Sync {
    /// A probe failed; `attempt` starts at 1 and grows by one per failure
    fn on_wait(&self, attempt: u32, name: &str) {
        let _ = (attempt, name);
    }

    /// The probe succeeded after `elapsed`
    fn on_acquired(&self, name: &str, elapsed: Duration) {
        let _ = (name, elapsed);
    }

    /// Admission timed out; called at most once per `execute`
    fn on_timeout(&self, name: &str, timeout: Duration) {
        let _ = (name, timeout);
    }
}

impl<T: GateObserver + ?Sized> GateObserver for Arc<T> {
    fn on_wait(&self, attempt: u32, name: &str) {
        (**self).on_wait(attempt, name)
    }

    fn on_acquired(&self, name: &str, elapsed: Duration) {
        (**self).on_acquired(name, elapsed)
    }

    fn on_timeout(&self, name: &str, timeout: Duration) {
        (**self).on_timeout(name, timeout)
    }
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl GateObserver for NoopObserver {}

/// Observer that reports through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl GateObserver for TracingObserver {
    fn on_wait(&self, attempt: u32, name: &str) {
        tracing::info!("#{} Waiting for shared access to {}.", attempt, name);
    }

    fn on_acquired(&self, name: &str, elapsed: Duration) {
        tracing::debug!("Acquired shared access to {} in {:?}.", name, elapsed);
    }

    fn on_timeout(&self, name: &str, timeout: Duration) {
        tracing::error!("Failed to acquire {} in {:?}.", name, timeout);
    }
}
