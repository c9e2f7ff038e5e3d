//! File-backed named lock
//!
//! A name maps to `<lock_dir>/<encoded name>.lock`. Upper-case letters and
//! bytes outside `[a-z0-9._-]` are escaped as `%xx`, so the file name contains
//! no upper-case letters and two different names never end up on the same
//! file, even on a case-insensitive filesystem. Encodings longer than
//! [`MAX_STEM_LEN`] are shortened to a readable prefix plus `~` and the
//! SHA-256 of the full name, which keeps them under the usual 255-byte file
//! name limit.

use super::{LockError, NamedLock};
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

const LOCK_EXTENSION: &str = "lock";

/// Longest file stem produced by [`encode_name`]
pub const MAX_STEM_LEN: usize = 200;

/// `~` plus 64 hex digits
const DIGEST_SUFFIX_LEN: usize = 65;

/// Directory used when neither the caller nor the config names one
pub fn default_lock_dir() -> PathBuf {
    std::env::temp_dir().join("buildgate")
}

/// Encodes a lock name into a file stem that is safe on every platform
pub fn encode_name(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || matches!(byte, b'.' | b'_' | b'-') {
            encoded.push(byte as char);
        } else {
            // Writing into a String cannot fail
            let _ = write!(encoded, "%{:02x}", byte);
        }
    }

    if encoded.len() <= MAX_STEM_LEN {
        return encoded;
    }

    // `~` is always escaped above, so shortened stems never equal a plain one
    let mut prefix_len = MAX_STEM_LEN - DIGEST_SUFFIX_LEN;
    while let Some(pos) = encoded[..prefix_len].rfind('%') {
        if pos + 3 <= prefix_len {
            break;
        }
        prefix_len = pos;
    }
    encoded.truncate(prefix_len);
    encoded.push('~');
    for byte in Sha256::digest(name.as_bytes()).iter() {
        let _ = write!(encoded, "{:02x}", byte);
    }
    encoded
}

/// Path of the lock file backing `name` inside `lock_dir`
pub fn lock_path_for(lock_dir: &Path, name: &str) -> PathBuf {
    lock_dir.join(format!("{}.{}", encode_name(name), LOCK_EXTENSION))
}

/// Named lock backed by an advisory `fs2` file lock
///
/// The file handle lives as long as this value. Dropping it closes the handle,
/// which also drops any advisory lock still held through it. The lock file
/// itself is never removed.
#[derive(Debug)]
pub struct FileNamedLock {
    file: File,
    name: String,
    path: PathBuf,
    held: bool,
}

impl FileNamedLock {
    /// Opens (creating if needed) the lock file for `name` in `lock_dir`
    pub fn open(lock_dir: &Path, name: &str) -> Result<Self, LockError> {
        if name.is_empty() {
            return Err(LockError::InvalidName);
        }

        let path = lock_path_for(lock_dir, name);
        let io_err = |source, operation| LockError::Io {
            source,
            name: name.to_string(),
            path: path.clone(),
            operation,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(e, "create lock directory"))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| io_err(e, "open lock file"))?;

        Ok(Self {
            file,
            name: name.to_string(),
            path,
            held: false,
        })
    }

    /// Path of the backing lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error, operation: &'static str) -> LockError {
        LockError::Io {
            source,
            name: self.name.clone(),
            path: self.path.clone(),
            operation,
        }
    }
}

impl NamedLock for FileNamedLock {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_acquire(&mut self) -> Result<bool, LockError> {
        match self.file.try_lock_exclusive() {
            Ok(()) => {
                self.held = true;
                Ok(true)
            }
            Err(e) if is_contended(&e) => Ok(false),
            Err(e) => Err(self.io_error(e, "probe")),
        }
    }

    fn release(&mut self) -> Result<(), LockError> {
        if !self.held {
            return Ok(());
        }
        FileExt::unlock(&self.file).map_err(|e| self.io_error(e, "release"))?;
        self.held = false;
        Ok(())
    }
}

/// Whether a failed `try_lock_exclusive` means "someone else holds it"
fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
