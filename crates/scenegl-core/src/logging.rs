//! Tracing subscriber setup for hosts (binaries, demos). Library crates only emit events.

use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Install a global fmt subscriber. `RUST_LOG` overrides `default_filter` when set.
///
/// Calling this twice is an error (the global subscriber can only be set once).
pub fn init_tracing(default_filter: &str) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| EngineError::other(format!("invalid log filter '{default_filter}': {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| EngineError::other(format!("tracing subscriber already set: {e}")))
}
