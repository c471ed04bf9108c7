//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers and route groups
//! - Wire up middleware (request id, tracing, access log, CORS, security,
//!   limits, panic recovery, timeout)
//! - Serve on a plain TCP listener or TLS, with graceful shutdown

use std::any::Any;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::response::{IntoResponse, Response};
use axum::{middleware, Router};
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::cache::ConnectionCheck;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::middleware::{
    cors::is_fully_permissive, cors_layer, enforce_security, log_requests, AccessLog,
    RequestLogger, SecurityPolicy,
};
use crate::http::request::UuidRequestId;
use crate::routes::{self, RouteGroups};

/// Application state injected into the built-in handlers.
#[derive(Clone)]
pub struct AppState {
    pub checker: Arc<dyn ConnectionCheck>,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the complete application: routes plus middleware.
#[allow(deprecated)]
pub fn build_router(
    config: &GatewayConfig,
    groups: RouteGroups,
    checker: Arc<dyn ConnectionCheck>,
    logger: Arc<dyn RequestLogger>,
) -> Router {
    let tls = config.listener.tls.is_some();

    if is_fully_permissive(&config.cors) {
        tracing::warn!(
            "CORS allows every origin with credentials; restrict [cors].allow_origins for browser-facing deployments"
        );
    }

    let security = SecurityPolicy::new(&config.security, tls);
    if security.is_active() {
        tracing::info!(
            https_redirect = config.security.https_redirect,
            trusted_hosts = ?config.security.trusted_hosts,
            "Host and scheme enforcement enabled"
        );
    }

    routes::routes(AppState { checker }, groups)
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
        .layer(middleware::from_fn_with_state(security, enforce_security))
        .layer(cors_layer(&config.cors))
        .layer(middleware::from_fn_with_state(
            AccessLog::new(logger, tls),
            log_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = message, "Handler panicked");
    GatewayError::Internal.into_response()
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    grace: Duration,
}

impl GatewayServer {
    pub fn new(
        config: &GatewayConfig,
        groups: RouteGroups,
        checker: Arc<dyn ConnectionCheck>,
        logger: Arc<dyn RequestLogger>,
    ) -> Self {
        Self {
            router: build_router(config, groups, checker, logger),
            grace: Duration::from_secs(config.timeouts.shutdown_grace_secs),
        }
    }

    /// The fully layered router, for driving without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve plain HTTP until `shutdown` fires, then drain for up to the
    /// grace period.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining requests");
                let _ = drain_tx.send(());
            });

        let grace = self.grace;
        tokio::select! {
            result = server.into_future() => result?,
            _ = async move {
                if drain_rx.await.is_ok() {
                    tokio::time::sleep(grace).await;
                } else {
                    std::future::pending::<()>().await;
                }
            } => {
                tracing::warn!(grace = ?grace, "Grace period expired, dropping open connections");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let grace = self.grace;
        let signal_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received, draining requests");
            signal_handle.graceful_shutdown(Some(grace));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}
