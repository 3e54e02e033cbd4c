//! Logging utilities

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when neither `RUST_LOG` nor `ORDERSCAN_LOG_LEVEL` is set
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Resolve the filter directive used by [`init_logging`]
pub fn log_filter_directive() -> String {
    std::env::var("RUST_LOG")
        .or_else(|_| std::env::var("ORDERSCAN_LOG_LEVEL"))
        .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
}

/// Initialize the global logging system
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    init_logging_with(&log_filter_directive());
}

/// Initialize logging with an explicit filter directive (e.g. from a CLI flag)
pub fn init_logging_with(directive: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_new(directive)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_LEVEL));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
