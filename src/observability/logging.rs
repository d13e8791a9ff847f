//! Diagnostics logging.
//!
//! Records go to stdout through the sink; the crate's own diagnostics
//! (bind address, config fallbacks, dropped writes) go through `tracing` to
//! stderr so the record stream stays machine-readable.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global diagnostics subscriber.
///
/// `RUST_LOG` wins over `level`. Calling this twice is harmless; the second
/// call leaves the first subscriber in place.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stacklog={level},tower_http={level}")));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if let Err(e) = result {
        tracing::debug!(error = %e, "Diagnostics subscriber already installed");
    }
}

/// Run `f` with a temporary stderr subscriber at the default level.
///
/// Diagnostics emitted while loading configuration happen before the configured
/// level is known.
pub fn with_bootstrap<T>(f: impl FnOnce() -> T) -> T {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new("stacklog=info"))
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}
