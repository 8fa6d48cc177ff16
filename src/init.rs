// Logging/tracing setup

/// Initialize tracing with the requested level; idempotent.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    // Ignore the error if a subscriber is already installed.
    let _ = tracing::subscriber::set_global_default(registry.with(fmt::layer()));
}
