// ABOUTME: Tracing subscriber setup for the courier binary
// ABOUTME: RUST_LOG wins over the configured filter when both are present

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false) // Don't show module paths in logs
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
