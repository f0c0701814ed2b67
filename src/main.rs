//! Progress Notification CLI Tool
//!
//! Runs simulated background tasks whose progress is forwarded to a
//! notification worker through progress handles.

use clap::Parser;
use notify_progress::cli::{run, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
