//! Test utilities for buildgate
//!
//! This crate provides shared testing utilities used across the buildgate workspace.

use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a temporary directory within `.tmp/` at the current directory
///
/// Keeps test lock directories and config files out of the system temp dir,
/// so a stray lock file from a failed run is easy to find and remove.
///
/// # Panics
///
/// Panics if:
/// - Unable to determine current directory
/// - Unable to create `.tmp/` directory
/// - Unable to create temporary subdirectory
///
/// # Examples
///
/// ```rust
/// use buildgate_testkit::temp_dir_in_workspace;
///
/// let temp = temp_dir_in_workspace();
/// let lock_dir = temp.path().join("locks");
/// std::fs::create_dir_all(&lock_dir).unwrap();
/// // Cleanup happens automatically when temp is dropped
/// ```
pub fn temp_dir_in_workspace() -> TempDir {
    try_temp_dir_in_workspace().expect("Failed to create temporary directory in .tmp/")
}

/// Alternative with Result for non-test code
pub fn try_temp_dir_in_workspace() -> std::io::Result<TempDir> {
    let workspace_root = std::env::current_dir()?;
    let tmp_base = workspace_root.join(".tmp");
    std::fs::create_dir_all(&tmp_base)?;
    TempDir::new_in(&tmp_base)
}

/// Get the path to a compiled example binary
///
/// Example binaries are built by `cargo test` into `target/<profile>/examples/`,
/// next to the `deps/` directory holding the running test binary.
///
/// # Panics
///
/// Panics if unable to determine the current executable path
///
/// # Examples
///
/// ```no_run
/// use buildgate_testkit::example_bin;
/// use std::process::Command;
///
/// let status = Command::new(example_bin("gate_holder"))
///     .args(["/tmp/locks", "build-lock-A", "100"])
///     .status()
///     .unwrap();
/// assert!(status.success());
/// ```
pub fn example_bin(name: &str) -> PathBuf {
    let mut path = std::env::current_exe().expect("Failed to get current executable path");

    // Navigate from target/debug/deps/test_binary to target/debug/examples/
    path.pop();
    path.pop();
    path.push("examples");
    path.push(name);

    if cfg!(target_os = "windows") {
        path.set_extension("exe");
    }

    path
}
