//! Structured logging setup.
//!
//! The library itself only emits `tracing` events. Hosts that already install
//! a subscriber keep theirs; [`init_logging`] is for binaries and tests that
//! want one quickly.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the filter directive, e.g. `turnstack=debug`.
pub const LOG_ENV: &str = "TURNSTACK_LOG";

const DEFAULT_FILTER: &str = "info";

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install a console subscriber filtered by [`LOG_ENV`].
///
/// Safe to call more than once. If another global subscriber is already set,
/// it is left in place.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = log_filter();
        let directive = filter.to_string();

        let result = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true),
            )
            .with(filter)
            .try_init();

        if result.is_err() {
            tracing::debug!("Global tracing subscriber already initialized - keeping it");
            return;
        }

        tracing::info!(filter = %directive, "Logging initialized");
    });
}

/// Filter from [`LOG_ENV`], falling back to `info` when unset or invalid.
pub fn log_filter() -> EnvFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
