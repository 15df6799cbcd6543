//! Log output for hosts that don't install their own subscriber.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, or by `default`
/// (e.g. `"skinforge=info"`) when `RUST_LOG` is unset or invalid.
///
/// Returns `false` if a global subscriber was already installed; the
/// existing one is left alone.
pub fn init(default: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .is_ok()
}
