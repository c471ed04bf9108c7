//! KYC Verification Gateway
//!
//! HTTP entrypoint for PAN card KYC and bank account verification.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ request id ─▶ access log ─▶ CORS ─▶ host/scheme checks ─▶ router
//!                                                                         │
//!                          ┌───────────────┬───────────────┬──────────────┤
//!                          ▼               ▼               ▼              ▼
//!                      GET / , /health   GET /ready    /pancard/*    /bankaccount/*
//!                                          │               │              │
//!                                          ▼               ▼              ▼
//!                                        Redis      KYC upstream   bank upstream
//! ```
//!
//! Startup checks Redis before anything is bound; an unreachable cache
//! exits with a non-zero status.

use std::path::PathBuf;

use clap::Parser;

use kyc_gateway::config::{load_with_overrides, ConfigError, ConfigOverrides};
use kyc_gateway::lifecycle::{shutdown_signal, Shutdown};
use kyc_gateway::observability::{logging, metrics};
use kyc_gateway::Gateway;

#[derive(Parser)]
#[command(name = "kyc-gateway")]
#[command(about = "HTTP gateway for PAN card KYC and bank account verification", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(long, env = "GATEWAY_BIND")]
    bind: Option<String>,

    /// Override `cache.url`.
    #[arg(long, env = "REDIS_URL")]
    cache_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        bind_address: cli.bind,
        cache_url: cli.cache_url,
    };
    let config = match load_with_overrides(cli.config.as_deref(), overrides) {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            for e in &errors {
                eprintln!("invalid configuration: {}", e);
            }
            return Err(format!("{} configuration error(s)", errors.len()).into());
        }
        Err(e) => return Err(e.into()),
    };

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "kyc-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        cache = %config.cache.url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    if let Err(e) = Gateway::new(config).run(server_shutdown).await {
        tracing::error!(error = %e, "Gateway exited with error");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
