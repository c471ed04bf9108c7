//! Request inspection helpers.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) when the client sent none
//! - Work out the scheme, host and full URL a client actually used
//!
//! # Design Decisions
//! - `X-Forwarded-Proto` wins over the listener's own scheme, since TLS is
//!   often terminated in front of the gateway
//! - The URL is rebuilt from the `Host` header, falling back to the
//!   HTTP/2 `:authority` carried in the URI

use axum::extract::OriginalUri;
use axum::http::{header, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Request ID generator for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID header value, if any.
pub fn request_id<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
}

/// Scheme the client used: `X-Forwarded-Proto` first, else the listener's.
pub fn effective_scheme<B>(request: &Request<B>, tls: bool) -> String {
    request
        .headers()
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| (if tls { "https" } else { "http" }).to_string())
}

/// `Host` header (with port, if sent) or the URI authority.
pub fn request_host<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
}

/// Host without its port.
pub fn hostname(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal, e.g. "[::1]:8000"
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}

/// The URI as the client sent it, before any prefix stripping by nested
/// routers.
pub fn original_uri<B>(request: &Request<B>) -> &Uri {
    request
        .extensions()
        .get::<OriginalUri>()
        .map(|o| &o.0)
        .unwrap_or_else(|| request.uri())
}

/// `scheme://host/path?query` as the client saw it.
pub fn full_url<B>(request: &Request<B>, tls: bool) -> String {
    let uri = original_uri(request);
    let path_and_query = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let host = request_host(request).unwrap_or("localhost");
    format!(
        "{}://{}{}",
        effective_scheme(request, tls),
        host,
        path_and_query
    )
}
