//! CLI command structure using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "buildgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to buildgate.toml (defaults to ./buildgate.toml if present)
    #[arg(long, global = true, env = "BUILDGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the lock files; must be shared by all contenders
    #[arg(long, global = true, env = "BUILDGATE_LOCK_DIR")]
    pub lock_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a command once no exclusive holder of the name is active
    #[command(trailing_var_arg = true)]
    Run {
        /// Gate name shared by all contenders
        #[arg(long)]
        name: String,

        /// Maximum admission wait in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Pause between probes in milliseconds
        #[arg(long)]
        retry_interval_ms: Option<u64>,

        /// Command to run (after --)
        #[arg(required = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Hold a name exclusively so gated commands wait
    Hold {
        #[arg(long)]
        name: String,

        /// Maximum wait for the name in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Release after this many milliseconds instead of at stdin EOF
        #[arg(long)]
        duration_ms: Option<u64>,
    },

    /// Probe once whether a name is held
    Status {
        #[arg(long)]
        name: String,

        #[arg(long)]
        json: bool,
    },
}
