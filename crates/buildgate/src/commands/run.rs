//! Run command - execute a command behind a named gate

use crate::context::Context;
use anyhow::{Context as _, Result, anyhow};
use colored::Colorize;
use std::process::{Command, ExitStatus};

/// Waits for admission to `name`, then runs `command` and returns its exit code
///
/// The gate is released before the command starts, so the command itself is
/// not serialized against other `run` invocations.
pub fn run(
    ctx: &Context,
    name: String,
    timeout_ms: Option<u64>,
    retry_interval_ms: Option<u64>,
    command: Vec<String>,
) -> Result<i32> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow!("No command given"))?;

    let gate = ctx.gate(&name, timeout_ms, retry_interval_ms);

    if ctx.verbose {
        eprintln!(
            "{} Waiting for admission to '{}' (timeout {:?}, lock dir {})",
            "→".cyan(),
            name,
            gate.timeout(),
            gate.lock_dir().display()
        );
    }

    let status = gate
        .execute(|| Command::new(program).args(args).status())?
        .with_context(|| format!("Failed to start '{}'", program))?;

    if ctx.verbose {
        eprintln!("{} '{}' exited with {}", "✓".green().bold(), program, status);
    }

    Ok(exit_code(status))
}

/// Exit code to forward; signal-terminated children map to 1
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
