//! Structured logging.
//!
//! One `tracing` subscriber for the whole process, installed by `main`.
//! `RUST_LOG` wins over the configured level. JSON output is meant for log
//! aggregation, pretty output for a terminal.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Default filter when `RUST_LOG` is unset. `tower_http` stays at `info`
/// whatever the gateway's own level.
pub fn default_filter(config: &ObservabilityConfig) -> String {
    format!("kyc_gateway={},tower_http=info", config.log_level)
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config).into());

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
