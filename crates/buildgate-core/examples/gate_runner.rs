//! Helper binary that runs gated work in its own process
//!
//! Usage: gate_runner <lock_dir> <name> <timeout_ms> <marker_path> <runner_id>
//!
//! On admission appends `runner_<id> ran` to the marker file and exits 0.
//! Exits 3 when admission timed out, 1 on any other error.

use buildgate_core::gate::NamedGate;
use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

const EXIT_TIMEOUT: i32 = 3;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 6 {
        eprintln!("Usage: gate_runner <lock_dir> <name> <timeout_ms> <marker_path> <runner_id>");
        std::process::exit(1);
    }

    let lock_dir = PathBuf::from(&args[1]);
    let name = &args[2];
    let timeout_ms: u64 = args[3].parse().expect("timeout_ms must be a number");
    let marker_path = PathBuf::from(&args[4]);
    let runner_id = &args[5];

    let gate = NamedGate::new(name.as_str(), Duration::from_millis(timeout_ms))
        .with_lock_dir(lock_dir)
        .with_retry_interval(Duration::from_millis(20));

    let result = gate.execute(|| {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&marker_path)
            .expect("Failed to open marker file");
        writeln!(file, "runner_{} ran", runner_id).expect("Failed to write marker");
    });

    match result {
        Ok(()) => println!("Runner {} completed", runner_id),
        Err(e) if e.is_timeout() => {
            eprintln!("{}", e);
            std::process::exit(EXIT_TIMEOUT);
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
