//! Status command - probe a name once

use crate::context::Context;
use crate::output::{print_json, print_text};
use anyhow::Result;
use buildgate_core::lock::{FileNamedLock, NamedLock};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct StatusReport {
    name: String,
    path: PathBuf,
    busy: bool,
}

/// Reports whether `name` is currently held; the probe is released right away
pub fn run(ctx: &Context, name: String, json: bool) -> Result<i32> {
    let mut lock = FileNamedLock::open(&ctx.lock_dir(), &name)?;
    let busy = !lock.try_acquire()?;
    lock.release()?;

    let report = StatusReport {
        path: lock.path().to_path_buf(),
        name,
        busy,
    };

    if json {
        print_json(&serde_json::to_string_pretty(&report)?)?;
    } else if report.busy {
        print_text(&format!(
            "{} {} is busy ({})",
            "✗".yellow().bold(),
            report.name,
            report.path.display()
        ))?;
    } else {
        print_text(&format!(
            "{} {} is free ({})",
            "✓".green().bold(),
            report.name,
            report.path.display()
        ))?;
    }

    Ok(0)
}
