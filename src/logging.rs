#![deny(warnings)]

// Logging setup for the filewriter binary

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static LOGGING_INIT: Once = Once::new();

/// Default filter when neither `--log-level` nor `RUST_LOG` is set
const DEFAULT_FILTER: &str = "warn";

/// Install a stderr fmt subscriber.
///
/// `level` takes precedence over `RUST_LOG`. Repeated calls are no-ops once
/// initialization has run.
pub fn init_logging(level: Option<&str>) -> anyhow::Result<()> {
    let mut init_result = Ok(());

    LOGGING_INIT.call_once(|| {
        init_result = tracing_subscriber::fmt()
            .with_env_filter(env_filter(level))
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"));
    });

    init_result
}

fn env_filter(level: Option<&str>) -> EnvFilter {
    if let Some(filter) = level.and_then(|l| EnvFilter::try_new(l).ok()) {
        return filter;
    }
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(DEFAULT_FILTER),
    }
}
