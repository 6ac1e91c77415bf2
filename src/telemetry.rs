//! Tracing setup for binaries and tests embedding the engine.

use tracing_subscriber::EnvFilter;

/// Installs a formatted `tracing` subscriber honoring `RUST_LOG`, with
/// `info` as the default level. Safe to call more than once; later calls
/// are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
