//! # Structured Logging
//!
//! Environment-aware tracing initialization for hosts embedding the
//! workflow core. Safe to call more than once; the first caller wins and an
//! already-installed global subscriber is left in place.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize tracing output with an env-filter (`RUST_LOG`, default `info`)
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let registry = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(filter),
        );

        // A host application may already have a subscriber installed.
        let _ = registry.try_init();
    });
}
