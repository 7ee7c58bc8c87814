use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber for the binaries. `RUST_LOG` overrides the
/// default `info` filter. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
