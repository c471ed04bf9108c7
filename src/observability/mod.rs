//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http::middleware::logging (one record per request)
//!     → logging.rs (tracing events, pretty or JSON)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (log aggregation)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every access log line
//! - Metrics are off by default; recording without an exporter is free

pub mod logging;
pub mod metrics;
