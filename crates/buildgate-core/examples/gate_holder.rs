//! Helper binary that holds a named lock exclusively for a while
//!
//! Usage: gate_holder <lock_dir> <name> <hold_ms>
//!
//! Prints `held` on stdout once the lock is taken, so a parent test can
//! start contending only after this process really is the holder.

use buildgate_core::lock::hold;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: gate_holder <lock_dir> <name> <hold_ms>");
        std::process::exit(1);
    }

    let lock_dir = PathBuf::from(&args[1]);
    let name = &args[2];
    let hold_ms: u64 = args[3].parse().expect("hold_ms must be a number");

    let _guard = hold(&lock_dir, name, Duration::from_secs(30)).expect("Failed to hold lock");

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "held").expect("Failed to write to stdout");
    stdout.flush().expect("Failed to flush stdout");
    drop(stdout);

    std::thread::sleep(Duration::from_millis(hold_ms));

    // Lock released via Drop
}
