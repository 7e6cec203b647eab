//! Log output for the `tally` binary
//!
//! Library code only emits `tracing` events; the binary installs the
//! subscriber. `RUST_LOG` takes precedence over the `--verbose` default.

use tracing_subscriber::EnvFilter;

use crate::error::{TallyError, TallyResult};

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "tally=debug"
    } else {
        "tally=warn"
    }
}

/// Install a stderr subscriber
pub fn init_logging(verbose: bool) -> TallyResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| TallyError::Config(format!("Failed to initialize logging: {}", e)))
}
