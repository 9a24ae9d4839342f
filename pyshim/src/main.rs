//! pyshim
//!
//! Bootstrap executable: starts the interpreter from `./venv` and runs
//! `./main.py`. Launch failures are reported on stdout and turned into a
//! non-zero exit status; logging goes to stderr.

use std::io;
use std::panic;

use anyhow::{anyhow, Result};
use pyshim_core::error::FAILURE_EXIT_CODE;
use pyshim_core::{launch, LaunchConfig};
use tracing::{debug, error, Level};

fn main() -> Result<()> {
    // Quiet by default: a successful run prints nothing of its own.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::WARN)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {}", e))?;

    let config = LaunchConfig::default().with_script_args(std::env::args_os().skip(1));
    debug!("pyshim starting: {:?}", config);

    let code = run(&config);
    debug!("pyshim exiting with {}", code);
    std::process::exit(code)
}

/// Outermost error boundary. Returns the process exit code.
fn run(config: &LaunchConfig) -> i32 {
    match panic::catch_unwind(|| launch(config)) {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            println!("{}", e);
            e.exit_code()
        }
        Err(_) => {
            error!("launch panicked");
            println!("Failed to launch: unexpected internal error");
            FAILURE_EXIT_CODE
        }
    }
}
