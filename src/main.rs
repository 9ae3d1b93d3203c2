use clap::Parser;
use std::fs::{self, OpenOptions};
use std::process::ExitCode;
use std::sync::Mutex;

use deltadesk::cli::{Cli, Commands};
use deltadesk::paths;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DELTADESK_LOG";

/// Logs go to stderr, except for the full-screen console which would be
/// corrupted by them; it appends to `.deltadesk/deltadesk.log` instead.
fn init_logging(command: &Commands) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    if matches!(command, Commands::Open { .. }) {
        let path = paths::log_path();
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        return;
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.command);

    match cli.command.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
