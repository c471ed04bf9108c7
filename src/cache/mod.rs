//! Cache dependency subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle::startup (once, before bind)
//!     → ConnectionCheck::check_connection()
//!     → redis.rs (AUTH / SELECT / PING over RESP)
//!
//! routes::probes (/ready, per request)
//!     → same ConnectionCheck, shared through AppState
//! ```
//!
//! # Design Decisions
//! - Only reachability is checked; no data is read or written
//! - The check is a trait object so tests and embedders can swap it

pub mod redis;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

pub use redis::{RedisConnectionCheck, RedisTarget};

/// Why a connection check failed.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid cache url: {0}")]
    InvalidUrl(String),
    #[error("connect failed: {0}")]
    Connect(std::io::Error),
    #[error("io error: {0}")]
    Io(std::io::Error),
    #[error("connection closed before reply")]
    Closed,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("server rejected command: {0}")]
    Rejected(String),
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

/// Anything whose reachability can be probed.
///
/// Implementations must be idempotent and usable before any other part of
/// the gateway is initialized.
pub trait ConnectionCheck: Send + Sync + 'static {
    fn check_connection(&self) -> BoxFuture<'_, Result<(), CacheError>>;

    /// Human-readable target for logs.
    fn describe(&self) -> String;
}

/// A check whose outcome is set by hand.
#[derive(Debug)]
pub struct StaticConnectionCheck {
    reachable: AtomicBool,
}

impl StaticConnectionCheck {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: AtomicBool::new(reachable),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }
}

impl ConnectionCheck for StaticConnectionCheck {
    fn check_connection(&self) -> BoxFuture<'_, Result<(), CacheError>> {
        let reachable = self.reachable.load(Ordering::SeqCst);
        Box::pin(async move {
            if reachable {
                Ok(())
            } else {
                Err(CacheError::Closed)
            }
        })
    }

    fn describe(&self) -> String {
        "static check".to_string()
    }
}
