mod cli;
mod commands;
mod context;
mod output;

use buildgate_core::lock::LockError;
use clap::Parser;
use cli::{Cli, Commands};
use context::Context;
use tracing_subscriber::EnvFilter;

/// Exit code when admission timed out and the gated command never ran
const EXIT_TIMEOUT: i32 = 124;

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so gated commands keep stdout to themselves
    let default_level = if cli.verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = Context::new(cli.config.as_deref(), cli.lock_dir, cli.verbose).and_then(|ctx| {
        match cli.command {
            Commands::Run {
                name,
                timeout_ms,
                retry_interval_ms,
                command,
            } => commands::run::run(&ctx, name, timeout_ms, retry_interval_ms, command),
            Commands::Hold {
                name,
                timeout_ms,
                duration_ms,
            } => commands::hold::run(&ctx, name, timeout_ms, duration_ms),
            Commands::Status { name, json } => commands::status::run(&ctx, name, json),
        }
    });

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) if is_timeout(&e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_TIMEOUT);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn is_timeout(err: &anyhow::Error) -> bool {
    err.downcast_ref::<LockError>()
        .is_some_and(LockError::is_timeout)
}
