//! Tracing initialisation for the herald process.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the global tracing subscriber.
///
/// The filter is taken from the `LOG_LEVEL` environment variable when
/// set, otherwise it defaults to `debug` in debug builds and `info` in
/// release builds.
pub fn init() {
    let default = if cfg!(debug_assertions) { "debug" } else { "info" };

    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_file(false)
                .with_line_number(false),
        )
        .with(filter)
        .init();
}
