//! Tracing initialization for the CLI.
//!
//! The library only emits events; installing a subscriber is the binary's job.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "RIGOUR_LOG";

/// Initialize logging to stderr.
///
/// Reads `RIGOUR_LOG` for the filter (e.g. `RIGOUR_LOG=rigour::gates=debug`),
/// falling back to `rigour=warn`, or `rigour=debug` when `verbose` is set.
/// Safe to call more than once.
pub fn init(verbose: bool) {
    INIT.call_once(|| {
        let default = if verbose { "rigour=debug" } else { "rigour=warn" };
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .without_time(),
            )
            .with(filter)
            .init();
    });
}
