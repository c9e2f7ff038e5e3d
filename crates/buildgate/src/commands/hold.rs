//! Hold command - keep a name busy so gated commands wait

use crate::context::Context;
use crate::output::print_text;
use anyhow::Result;
use buildgate_core::lock::hold;
use colored::Colorize;
use std::io;
use std::thread;
use std::time::Duration;

/// Holds `name` exclusively until `duration_ms` passes or stdin reaches EOF
pub fn run(
    ctx: &Context,
    name: String,
    timeout_ms: Option<u64>,
    duration_ms: Option<u64>,
) -> Result<i32> {
    let guard = hold(&ctx.lock_dir(), &name, ctx.timeout(timeout_ms))?;

    print_text(&format!("held {}", name))?;
    if ctx.verbose {
        eprintln!("{} Holding {}", "→".cyan(), guard.path().display());
    }

    match duration_ms {
        Some(ms) => thread::sleep(Duration::from_millis(ms)),
        None => {
            io::copy(&mut io::stdin().lock(), &mut io::sink())?;
        }
    }

    drop(guard);

    if ctx.verbose {
        eprintln!("{} Released '{}'", "✓".green().bold(), name);
    }

    Ok(0)
}
