//! RAII guard for exclusive holds

use super::{FileNamedLock, NamedLock};
use std::path::Path;

/// Keeps a named lock held until dropped
///
/// While the guard is alive every gate using the same name and lock
/// directory sees the name as busy.
#[derive(Debug)]
pub struct HoldGuard {
    pub(crate) lock: FileNamedLock,
}

impl HoldGuard {
    /// Name of the held lock
    pub fn name(&self) -> &str {
        self.lock.name()
    }

    /// Path of the backing lock file
    pub fn path(&self) -> &Path {
        self.lock.path()
    }
}

impl Drop for HoldGuard {
    fn drop(&mut self) {
        if let Err(e) = self.lock.release() {
            // Closing the handle right after still drops the advisory lock
            tracing::warn!("Failed to release {}: {}", self.lock.name(), e);
        }
    }
}
