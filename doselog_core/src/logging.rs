//! Logging setup for the doselog binary.
//!
//! Everything goes to stderr. Stdout is reserved for command output, which
//! may be a CSV or JSON export piped into another tool.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Quiet by default: only warnings, such as skipped rows, are shown
pub fn init() {
    init_with_level("warn")
}

/// `RUST_LOG` wins over `default_level` when it is set
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
