//! Structured logging setup.
//!
//! The filter is read from `MILVUS_HELPER_LOG` (same syntax as `RUST_LOG`),
//! e.g. `MILVUS_HELPER_LOG=milvus_helper=debug`.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "MILVUS_HELPER_LOG";

/// Install the global subscriber at `info` unless overridden by the
/// environment. Later calls are no-ops.
pub fn init() {
    init_with_default("info");
}

pub fn init_with_default(default_level: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}
