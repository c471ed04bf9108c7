//! Gateway bootstrap.
//!
//! Runs the startup gate, binds the listener only if it passes, serves until
//! shutdown, then runs the shutdown hook.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::cache::{CacheError, ConnectionCheck, RedisConnectionCheck};
use crate::config::GatewayConfig;
use crate::http::middleware::{RequestLogger, TracingRequestLogger};
use crate::http::server::{GatewayServer, ServerError};
use crate::lifecycle::{on_shutdown, on_startup, StartupError, StartupPolicy};
use crate::net::{load_tls_config, TlsError};
use crate::routes::RouteGroups;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("cache configuration: {0}")]
    Cache(#[from] CacheError),
    #[error("startup check failed: {0}")]
    Startup(#[from] StartupError),
    #[error("invalid bind address '{0}'")]
    Address(String),
    #[error("tls: {0}")]
    Tls(#[from] TlsError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// A configured, not yet started gateway.
pub struct Gateway {
    config: GatewayConfig,
    groups: Option<RouteGroups>,
    checker: Option<Arc<dyn ConnectionCheck>>,
    logger: Arc<dyn RequestLogger>,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            groups: None,
            checker: None,
            logger: Arc::new(TracingRequestLogger),
        }
    }

    /// Mount these routers instead of the configured upstreams.
    pub fn with_route_groups(mut self, groups: RouteGroups) -> Self {
        self.groups = Some(groups);
        self
    }

    /// Check this dependency instead of the configured Redis.
    pub fn with_connection_check(mut self, checker: Arc<dyn ConnectionCheck>) -> Self {
        self.checker = Some(checker);
        self
    }

    pub fn with_request_logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Check the cache, then serve until `shutdown` fires.
    ///
    /// Nothing is bound if the check fails.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), LaunchError> {
        let Gateway {
            config,
            groups,
            checker,
            logger,
        } = self;

        let addr: SocketAddr = config
            .listener
            .bind_address
            .parse()
            .map_err(|_| LaunchError::Address(config.listener.bind_address.clone()))?;

        let tls = match &config.listener.tls {
            Some(tls) => Some(load_tls_config(tls.cert_path.as_ref(), tls.key_path.as_ref()).await?),
            None => None,
        };

        let checker: Arc<dyn ConnectionCheck> = match checker {
            Some(checker) => checker,
            None => Arc::new(RedisConnectionCheck::from_url(
                &config.cache.url,
                Duration::from_secs(config.cache.connect_timeout_secs),
            )?),
        };
        on_startup(checker.as_ref(), StartupPolicy::from(&config.cache)).await?;

        let groups = groups.unwrap_or_else(|| RouteGroups::from_config(&config));
        let server = GatewayServer::new(&config, groups, checker, logger);

        match tls {
            Some(tls) => server.run_tls(addr, tls, shutdown).await?,
            None => {
                let listener = TcpListener::bind(addr)
                    .await
                    .map_err(|source| LaunchError::Bind { addr, source })?;
                tracing::info!(address = %listener.local_addr().unwrap_or(addr), "Listening for connections");
                server.run(listener, shutdown).await?;
            }
        }

        on_shutdown().await;
        Ok(())
    }
}
