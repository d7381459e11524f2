// src/observability/mod.rs
//! Logging and metrics setup
//!
//! The crate logs through `tracing` and counts through `metrics`; neither
//! installs anything on its own. Applications call [`init_tracing`] (or
//! install their own subscriber) and their own metrics recorder.

use crate::utils::config::LoggingConfig;
use crate::utils::errors::{AopError, Result};
use metrics::{describe_counter, Unit};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|err| AopError::ConfigError(format!("invalid log filter: {}", err)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|err| AopError::ConfigError(format!("tracing already initialised: {}", err)))
}

/// Register descriptions for the counters this crate emits
pub fn describe_metrics() {
    describe_counter!(
        "interpose_invocations_total",
        Unit::Count,
        "Calls dispatched through proxy advice chains"
    );
    describe_counter!(
        "interpose_target_faults_total",
        Unit::Count,
        "Faults raised by proxied targets"
    );
    describe_counter!(
        "interpose_transactions_total",
        Unit::Count,
        "Completed transactions by outcome"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "interpose=loud".to_string(),
            json: false,
        };
        assert!(matches!(init_tracing(&config), Err(AopError::ConfigError(_))));
    }

    #[test]
    fn test_describe_metrics_without_recorder() {
        describe_metrics();
    }
}
