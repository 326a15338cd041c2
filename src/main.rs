//! akt - command-line client for Akuntabel goals.

use std::process::ExitCode;

use akuntabel::cli::{self, Cli};
use tracing_subscriber::EnvFilter;

fn init_logging(debug: bool) {
    // Diagnostics go to stderr so stdout stays parseable under --json.
    let filter = if debug {
        EnvFilter::new("akuntabel=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("akuntabel=error"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Cli::parse_args();
    init_logging(args.debug);

    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
