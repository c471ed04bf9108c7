//! Access logging.
//!
//! Times every request and hands one [`RequestRecord`] to the injected
//! [`RequestLogger`] once the response exists. Request metrics are recorded
//! here too, whichever logger is installed. The request and response pass
//! through untouched. Handler panics are turned into 500s further in, so
//! they are logged like any other response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::request::{full_url, request_id};
use crate::observability::metrics;

/// What is known about a finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub method: Method,
    pub url: String,
    pub status: StatusCode,
    pub duration: Duration,
    pub request_id: Option<String>,
}

impl RequestRecord {
    /// `GET http://host/path - 200 - 0.000123s`
    pub fn summary(&self) -> String {
        format!(
            "{} {} - {} - {:.6}s",
            self.method,
            self.url,
            self.status.as_u16(),
            self.duration.as_secs_f64()
        )
    }
}

/// Sink for access records.
pub trait RequestLogger: Send + Sync + 'static {
    fn log(&self, record: &RequestRecord);
}

/// Writes access records as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRequestLogger;

impl RequestLogger for TracingRequestLogger {
    fn log(&self, record: &RequestRecord) {
        tracing::info!(
            target: "kyc_gateway::access",
            request_id = record.request_id.as_deref().unwrap_or("-"),
            method = %record.method,
            url = %record.url,
            status = record.status.as_u16(),
            duration_us = record.duration.as_micros() as u64,
            "{}",
            record.summary()
        );
    }
}

/// State for [`log_requests`].
#[derive(Clone)]
pub struct AccessLog {
    logger: Arc<dyn RequestLogger>,
    tls: bool,
}

impl AccessLog {
    pub fn new(logger: Arc<dyn RequestLogger>, tls: bool) -> Self {
        Self { logger, tls }
    }
}

pub async fn log_requests(State(access): State<AccessLog>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let url = full_url(&request, access.tls);
    let request_id = request_id(&request).map(str::to_string);

    let response = next.run(request).await;

    let record = RequestRecord {
        method,
        url,
        status: response.status(),
        duration: start.elapsed(),
        request_id,
    };
    metrics::record_request(record.method.as_str(), record.status.as_u16(), record.duration);
    access.logger.log(&record);
    response
}
