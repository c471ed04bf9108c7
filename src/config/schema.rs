//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Cache dependency checked at startup.
    pub cache: CacheConfig,

    /// Cross-origin policy applied to every route.
    pub cors: CorsConfig,

    /// HTTPS redirect, trusted hosts and body limits.
    pub security: SecurityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Upstream services behind the mounted route groups.
    pub upstreams: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Cache connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis URL, `redis://[:password@]host[:port][/db]`.
    pub url: String,

    /// Per-attempt connect and reply timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Number of connection checks before startup gives up.
    pub startup_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub retry_max_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connect_timeout_secs: 5,
            startup_attempts: 1,
            retry_base_delay_ms: 200,
            retry_max_delay_ms: 2000,
        }
    }
}

/// Cross-origin resource sharing policy.
///
/// `"*"` in any list means "allow whatever the request asks for".
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
    /// Preflight cache lifetime sent as `Access-Control-Max-Age`.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec!["*".to_string()],
            allow_methods: vec!["*".to_string()],
            allow_headers: vec!["*".to_string()],
            allow_credentials: true,
            max_age_secs: 600,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Redirect plain HTTP requests to HTTPS.
    pub https_redirect: bool,

    /// Allowed `Host` header values. Empty disables the check.
    pub trusted_hosts: Vec<String>,

    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            https_redirect: false,
            trusted_hosts: Vec::new(),
            max_body_size: 10 * 1024 * 1024, // 10MB, room for document uploads
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Timeout for a single forwarded upstream call in seconds.
    pub upstream_secs: u64,

    /// Time allowed for in-flight requests to drain on shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 25,
            shutdown_grace_secs: 10,
        }
    }
}

/// Base URLs of the services behind `/pancard` and `/bankaccount`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    pub pancard: Option<String>,
    pub bank_account: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// "pretty" for development, "json" for log aggregation.
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
        assert_eq!(config.cache.startup_attempts, 1);
        assert_eq!(config.cors.allow_origins, vec!["*"]);
        assert!(config.cors.allow_credentials);
        assert!(!config.security.https_redirect);
        assert!(config.upstreams.pancard.is_none());
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [cache]
            url = "redis://cache.internal:6380/2"

            [upstreams]
            pancard = "http://127.0.0.1:9001"

            [cors]
            allow_origins = ["https://app.example.com"]
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.url, "redis://cache.internal:6380/2");
        assert_eq!(config.cache.connect_timeout_secs, 5);
        assert_eq!(config.upstreams.pancard.as_deref(), Some("http://127.0.0.1:9001"));
        assert!(config.upstreams.bank_account.is_none());
        assert_eq!(config.cors.allow_methods, vec!["*"]);
    }
}
