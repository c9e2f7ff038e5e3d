//! Exclusive acquisition with backoff and timeout

use super::{FileNamedLock, HoldGuard, LockError, NamedLock};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(10);
const MAX_RETRY_DELAY: Duration = Duration::from_millis(500);
const PROGRESS_MESSAGE_THRESHOLD: Duration = Duration::from_secs(2);

/// Probes until the lock is ours or the timeout is reached
pub(crate) fn hold_with_retry(
    lock_dir: &Path,
    name: &str,
    timeout: Duration,
) -> Result<HoldGuard, LockError> {
    let mut lock = FileNamedLock::open(lock_dir, name)?;

    let start = Instant::now();
    let mut retry_delay = INITIAL_RETRY_DELAY;
    let mut progress_shown = false;

    loop {
        if lock.try_acquire()? {
            tracing::debug!(name, elapsed = ?start.elapsed(), "holding lock exclusively");
            return Ok(HoldGuard { lock });
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(LockError::Timeout {
                name: name.to_string(),
                timeout,
            });
        }

        if !progress_shown && elapsed >= PROGRESS_MESSAGE_THRESHOLD {
            tracing::info!(
                "Waiting for exclusive access to {} ({})...",
                name,
                lock.path().display()
            );
            progress_shown = true;
        }

        thread::sleep(retry_delay.min(timeout - elapsed));
        retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
    }
}
