//! Named locks for process-level coordination
//!
//! A named lock is identified by a string and contended by every thread and
//! process that uses the same name and lock directory. This module provides
//! the probe-able primitive ([`NamedLock`], backed by [`FileNamedLock`]) and
//! an exclusive hold ([`hold`]) for callers that need to keep a name busy,
//! e.g. a build step that must not overlap with gated work.

use std::path::Path;
use std::time::Duration;

mod acquire;
mod error;
mod file;
mod guard;

pub use error::LockError;
pub use file::{default_lock_dir, encode_name, lock_path_for, FileNamedLock, MAX_STEM_LEN};
pub use guard::HoldGuard;


/// A named, system-wide lock that can be probed without waiting
pub trait NamedLock {
    /// The name every contender uses
    fn name(&self) -> &str;

    /// Zero-wait acquisition attempt
    ///
    /// Returns `Ok(false)` when another holder currently has the lock.
    fn try_acquire(&mut self) -> Result<bool, LockError>;

    /// Releases the lock if this handle holds it
    fn release(&mut self) -> Result<(), LockError>;
}

/// Acquires the named lock exclusively and keeps it until the guard drops.
///
/// Retries with exponential backoff until `timeout` has elapsed. At least
/// one attempt is always made, so a zero timeout means "only if free now".
///
/// # Examples
///
/// ```no_run
/// use buildgate_core::lock::{default_lock_dir, hold};
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let guard = hold(&default_lock_dir(), "node-modules", Duration::from_secs(30))?;
/// // Gates named "node-modules" report busy while `guard` is alive
/// drop(guard);
/// # Ok(())
/// # }
/// ```
pub fn hold(lock_dir: &Path, name: &str, timeout: Duration) -> Result<HoldGuard, LockError> {
    acquire::hold_with_retry(lock_dir, name, timeout)
}
