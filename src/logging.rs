//! Diagnostic logging setup.
//!
//! Logs go to stderr so they never mix with the progress report on stdout.
//! `RUST_LOG` takes precedence over the level picked with `-v`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log level for a `-v` count: none is `warn`, then `info`, `debug`, `trace`.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. A second call keeps the first subscriber.
pub fn init_logging(verbosity: u8) {
    let filter = level_for(verbosity);
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
}
