//! Stderr logging for the CLI

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the filter directive
pub const LOG_ENV: &str = "TYPEPROBE_LOG";

/// Install the stderr subscriber.
///
/// The filter comes from `TYPEPROBE_LOG`, then `configured` (the config
/// file's `[log] filter`), then `warn`.
pub fn init_logging(configured: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries command output; logs go to stderr only
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}
