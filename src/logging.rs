//! Log subscriber setup.
//!
//! `RUST_LOG` selects the filter (default `info`); `PACKWISE_LOG_JSON`
//! switches the output to JSON lines.

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Call once, before anything logs.
pub fn init(config: &LoggingConfig) {
    let builder = fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_line_number(true);

    if config.json() {
        builder.json().init();
    } else {
        builder.init();
    }

    if let Some(raw) = config.rejected_json() {
        tracing::warn!(
            "Could not interpret {} ('{}') as boolean value. Using default value.",
            LoggingConfig::JSON_VAR,
            raw
        );
    }
}

/// Subscriber for tests: verbose and captured by the test harness.
#[cfg(test)]
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
