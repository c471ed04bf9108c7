//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics (URLs parse, timeouts
//! are positive, CORS and trusted-host entries are well formed). Every problem is
//! reported, not just the first.

use std::fmt;
use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method};
use url::Url;

use crate::config::schema::{CorsConfig, GatewayConfig, SecurityConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::new(
                "listener.tls",
                "cert_path and key_path must both be set",
            ));
        }
    }

    match Url::parse(&config.cache.url) {
        Ok(url) if url.scheme() != "redis" => errors.push(ValidationError::new(
            "cache.url",
            format!("unsupported scheme '{}', expected 'redis'", url.scheme()),
        )),
        Ok(url) if url.host_str().is_none() => {
            errors.push(ValidationError::new("cache.url", "missing host"))
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("cache.url", e.to_string())),
    }
    if config.cache.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("cache.connect_timeout_secs", "must be > 0"));
    }
    if config.cache.startup_attempts == 0 {
        errors.push(ValidationError::new("cache.startup_attempts", "must be >= 1"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be > 0"));
    }

    for (field, upstream) in [
        ("upstreams.pancard", &config.upstreams.pancard),
        ("upstreams.bank_account", &config.upstreams.bank_account),
    ] {
        if let Some(raw) = upstream {
            match Url::parse(raw) {
                Ok(url) if url.scheme() != "http" => errors.push(ValidationError::new(
                    field,
                    format!("unsupported scheme '{}', expected 'http'", url.scheme()),
                )),
                Ok(_) => {}
                Err(e) => errors.push(ValidationError::new(field, e.to_string())),
            }
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "not a socket address",
        ));
    }
    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            "expected 'pretty' or 'json'",
        ));
    }

    validate_cors(&config.cors, &mut errors);
    validate_trusted_hosts(&config.security, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_cors(cors: &CorsConfig, errors: &mut Vec<ValidationError>) {
    for origin in cors.allow_origins.iter().filter(|o| *o != "*") {
        if HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::new(
                "cors.allow_origins",
                format!("'{}' is not a valid header value", origin),
            ));
        }
    }
    for method in cors.allow_methods.iter().filter(|m| *m != "*") {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allow_methods",
                format!("'{}' is not an HTTP method", method),
            ));
        }
    }
    for header in cors.allow_headers.iter().filter(|h| *h != "*") {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allow_headers",
                format!("'{}' is not a header name", header),
            ));
        }
    }
}

/// Entries are `*`, `*.domain`, a bare host name, or a bracketed IPv6
/// literal. Ports are stripped from the request before matching, so an entry
/// carrying one could never match.
fn validate_trusted_hosts(security: &SecurityConfig, errors: &mut Vec<ValidationError>) {
    for entry in &security.trusted_hosts {
        let host = entry.trim();
        if host == "*" {
            continue;
        }
        let problem = if host.is_empty() {
            Some("empty entry")
        } else if let Some(rest) = host.strip_prefix('*') {
            match rest.strip_prefix('.') {
                Some(domain) if !domain.is_empty() && !domain.contains(['*', ':']) => None,
                _ => Some("wildcards must be '*' or of the form '*.domain'"),
            }
        } else if host.contains('*') {
            Some("wildcards are only allowed as a leading '*.'")
        } else if host.starts_with('[') {
            (!host.ends_with(']')).then_some("must not include a port")
        } else if host.contains(':') {
            Some("must not include a port")
        } else {
            None
        };
        if let Some(message) = problem {
            errors.push(ValidationError::new(
                "security.trusted_hosts",
                format!("'{}': {}", entry, message),
            ));
        }
    }
}
