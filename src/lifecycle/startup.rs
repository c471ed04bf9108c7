//! Startup gate.
//!
//! The gateway must not bind its listener until the cache answers. Failure
//! is returned as a value; `main` turns it into a non-zero exit.

use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;

use crate::cache::{CacheError, ConnectionCheck};
use crate::config::CacheConfig;
use crate::observability::metrics;

/// Fatal startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{target} unreachable after {attempts} attempt(s): {source}")]
    DependencyUnreachable {
        target: String,
        attempts: u32,
        #[source]
        source: CacheError,
    },
}

/// How hard to try before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl StartupPolicy {
    /// A single check, no retries.
    pub fn once() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based), doubling from
    /// `base_delay` up to `max_delay`, plus up to 10% jitter.
    pub fn delay_before(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let base_ms = self.base_delay.as_millis() as u64;
        let capped_ms = base_ms
            .saturating_mul(2u64.saturating_pow(retry - 1))
            .min(self.max_delay.as_millis() as u64);

        let jitter_ms = match capped_ms / 10 {
            0 => 0,
            range => rand::thread_rng().gen_range(0..range),
        };
        Duration::from_millis(capped_ms + jitter_ms)
    }
}

impl From<&CacheConfig> for StartupPolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            attempts: config.startup_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }
}

/// Verify the cache is reachable before serving.
pub async fn on_startup(
    checker: &dyn ConnectionCheck,
    policy: StartupPolicy,
) -> Result<(), StartupError> {
    tracing::info!(target_dependency = %checker.describe(), "Starting app...");

    let attempts = policy.attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let started = Instant::now();
        match checker.check_connection().await {
            Ok(()) => {
                metrics::record_cache_check(true);
                tracing::info!(
                    target_dependency = %checker.describe(),
                    attempt,
                    latency_ms = started.elapsed().as_millis() as u64,
                    "Cache connection established"
                );
                return Ok(());
            }
            Err(e) if attempt < attempts => {
                metrics::record_cache_check(false);
                let delay = policy.delay_before(attempt);
                tracing::warn!(
                    target_dependency = %checker.describe(),
                    attempt,
                    delay = ?delay,
                    error = %e,
                    "Cache connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                metrics::record_cache_check(false);
                tracing::error!(
                    target_dependency = %checker.describe(),
                    attempts,
                    error = %e,
                    "Failed to connect to cache. Shutting down..."
                );
                return Err(StartupError::DependencyUnreachable {
                    target: checker.describe(),
                    attempts,
                    source: e,
                });
            }
        }
    }
}
