//! Subscriber setup for binaries built on Tabula.
//!
//! The library crates only emit `tracing` events; nothing is printed until
//! a binary installs a subscriber.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs a formatted subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"info"` or `"tabula=debug"`) when the
/// variable is unset or invalid.
///
/// Returns `false` if a global subscriber was already installed, which
/// makes repeated calls (from tests, say) harmless.
pub fn init_logging(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}
