use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops), so tests
/// and the binary can both call it.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
