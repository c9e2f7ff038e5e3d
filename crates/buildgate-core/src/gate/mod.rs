//! Timeout-bounded admission through a named lock
//!
//! A [`NamedGate`] checks that nobody currently holds its name exclusively and
//! then runs the caller's work. The lock is taken only for the probe and
//! released before the work starts, so the gate does not serialize the work
//! itself: two callers can both pass and run concurrently. What it does
//! guarantee is that work never starts while an exclusive holder (see
//! [`hold`](crate::lock::hold)) is active, unless that holder outlasts the
//! timeout, in which case the work does not run at all.
//!
//! There is no fairness between waiting callers.

use crate::config::GateConfig;
use crate::lock::{default_lock_dir, FileNamedLock, LockError, NamedLock};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

mod observer;

pub use observer::{GateObserver, NoopObserver, TracingObserver};

#[cfg(test)]
mod tests;

/// Default pause between two probes
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// A named, timeout-bounded admission gate
///
/// Built once per use site and cheap to keep around; every
/// [`execute`](NamedGate::execute) call opens its own lock handle and closes
/// it before returning.
///
/// # Examples
///
/// ```no_run
/// use buildgate_core::gate::{NamedGate, TracingObserver};
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gate = NamedGate::new("build-lock-A", Duration::from_secs(30))
///     .with_observer(TracingObserver);
///
/// let compiled = gate.execute(|| true)?;
/// assert!(compiled);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NamedGate {
    name: String,
    timeout: Duration,
    retry_interval: Duration,
    lock_dir: PathBuf,
    observer: Arc<dyn GateObserver>,
}

impl NamedGate {
    /// Creates a gate with the default retry interval, lock directory and a
    /// no-op observer
    pub fn new(name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            timeout,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            lock_dir: default_lock_dir(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Creates a gate whose timeout, cadence and lock directory come from
    /// configuration
    pub fn from_config(name: impl Into<String>, config: &GateConfig) -> Self {
        Self::new(name, config.timeout())
            .with_retry_interval(config.retry_interval())
            .with_lock_dir(config.lock_dir())
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    pub fn with_lock_dir(mut self, lock_dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = lock_dir.into();
        self
    }

    pub fn with_observer(mut self, observer: impl GateObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Changes the poll cadence of an existing gate
    pub fn set_retry_interval(&mut self, retry_interval: Duration) {
        self.retry_interval = retry_interval;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub fn lock_dir(&self) -> &Path {
        &self.lock_dir
    }

    /// Waits for admission, then runs `work` once and returns its result.
    ///
    /// # Errors
    ///
    /// - [`LockError::Timeout`] if the name stayed busy past the timeout;
    ///   `work` was not run.
    /// - [`LockError::Io`] if the lock file could not be opened, probed or
    ///   released.
    /// - [`LockError::InvalidName`] / [`LockError::InvalidRetryInterval`] for
    ///   an empty name or a zero retry interval.
    pub fn execute<T, F>(&self, work: F) -> Result<T, LockError>
    where
        F: FnOnce() -> T,
    {
        self.validate()?;
        let mut lock = FileNamedLock::open(&self.lock_dir, &self.name)?;
        self.admit(&mut lock)?;
        Ok(work())
    }

    /// Same as [`execute`](NamedGate::execute), against a caller-supplied
    /// primitive instead of the lock file for this gate's name
    pub fn execute_on<L, T, F>(&self, lock: &mut L, work: F) -> Result<T, LockError>
    where
        L: NamedLock + ?Sized,
        F: FnOnce() -> T,
    {
        self.validate()?;
        self.admit(lock)?;
        Ok(work())
    }

    /// Probe loop; returns once the lock was observed free and released again
    fn admit<L: NamedLock + ?Sized>(&self, lock: &mut L) -> Result<(), LockError> {
        let stopwatch = Instant::now();
        let mut attempt: u32 = 1;

        while !lock.try_acquire()? {
            self.observer.on_wait(attempt, &self.name);
            attempt = attempt.saturating_add(1);

            thread::sleep(self.retry_interval);

            // Checked after sleeping: the worst case wait is timeout + retry_interval
            if stopwatch.elapsed() > self.timeout {
                self.observer.on_timeout(&self.name, self.timeout);
                return Err(LockError::Timeout {
                    name: self.name.clone(),
                    timeout: self.timeout,
                });
            }
        }

        self.observer.on_acquired(&self.name, stopwatch.elapsed());

        // Only needed to see that no exclusive holder is active
        lock.release()
    }

    fn validate(&self) -> Result<(), LockError> {
        if self.name.is_empty() {
            return Err(LockError::InvalidName);
        }
        if self.retry_interval.is_zero() {
            return Err(LockError::InvalidRetryInterval {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for NamedGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedGate")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("retry_interval", &self.retry_interval)
            .field("lock_dir", &self.lock_dir)
            .finish_non_exhaustive()
    }
}
