//! Trusted-host check and HTTPS redirect.
//!
//! Both are off by default: TLS may be terminated by a load balancer that
//! already rewrites hosts. Turn them on with `security.trusted_hosts` and
//! `security.https_redirect`.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::config::SecurityConfig;
use crate::error::GatewayError;
use crate::http::request::{effective_scheme, hostname, original_uri, request_host};

/// One entry of `security.trusted_hosts`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HostPattern {
    Any,
    Exact(String),
    /// `*.example.com`, stored as `.example.com`.
    Subdomain(String),
}

impl HostPattern {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_ascii_lowercase();
        if raw == "*" {
            HostPattern::Any
        } else if let Some(suffix) = raw.strip_prefix("*.") {
            HostPattern::Subdomain(format!(".{}", suffix))
        } else {
            HostPattern::Exact(raw)
        }
    }

    fn matches(&self, host: &str) -> bool {
        match self {
            HostPattern::Any => true,
            HostPattern::Exact(exact) => host == exact,
            HostPattern::Subdomain(suffix) => host.ends_with(suffix.as_str()),
        }
    }
}

/// State for [`enforce_security`].
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    https_redirect: bool,
    trusted_hosts: Arc<[HostPattern]>,
    tls: bool,
}

impl SecurityPolicy {
    pub fn new(config: &SecurityConfig, tls: bool) -> Self {
        Self {
            https_redirect: config.https_redirect,
            trusted_hosts: config
                .trusted_hosts
                .iter()
                .map(|h| HostPattern::parse(h))
                .collect(),
            tls,
        }
    }

    /// Whether the policy does anything at all.
    pub fn is_active(&self) -> bool {
        self.https_redirect || !self.trusted_hosts.is_empty()
    }

    fn host_allowed(&self, host: Option<&str>) -> bool {
        if self.trusted_hosts.is_empty() {
            return true;
        }
        let Some(host) = host else {
            return false;
        };
        let host = hostname(host).to_ascii_lowercase();
        self.trusted_hosts.iter().any(|p| p.matches(&host))
    }

    fn https_location(&self, request: &Request) -> Option<String> {
        if !self.https_redirect || effective_scheme(request, self.tls) != "http" {
            return None;
        }
        let host = request_host(request).unwrap_or("localhost");
        // Default ports are dropped so the redirect lands on 443.
        let netloc = match host.rsplit_once(':') {
            Some((name, "80")) | Some((name, "443")) => name,
            _ => host,
        };
        let path_and_query = original_uri(request)
            .path_and_query()
            .map(|p| p.as_str())
            .unwrap_or("/");
        Some(format!("https://{}{}", netloc, path_and_query))
    }
}

pub async fn enforce_security(
    State(policy): State<SecurityPolicy>,
    request: Request,
    next: Next,
) -> Response {
    if !policy.host_allowed(request_host(&request)) {
        tracing::warn!(
            host = request_host(&request).unwrap_or("-"),
            "Rejected request with untrusted host"
        );
        return GatewayError::InvalidHost.into_response();
    }

    if let Some(location) = policy.https_location(&request) {
        return Redirect::temporary(&location).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{middleware, Router};
    use tower::ServiceExt;

    fn app(config: SecurityConfig, tls: bool) -> Router {
        Router::new()
            .route("/{*path}", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                SecurityPolicy::new(&config, tls),
                enforce_security,
            ))
    }

    fn request(host: &str, uri: &str) -> Request {
        Request::builder()
            .uri(uri)
            .header("host", host)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_default_policy_is_inactive() {
        assert!(!SecurityPolicy::new(&SecurityConfig::default(), false).is_active());
    }

    #[test]
    fn test_host_patterns() {
        let config = SecurityConfig {
            trusted_hosts: vec!["kyc.example.com".into(), "*.internal".into()],
            ..SecurityConfig::default()
        };
        let policy = SecurityPolicy::new(&config, false);
        assert!(policy.host_allowed(Some("kyc.example.com")));
        assert!(policy.host_allowed(Some("KYC.example.com:8443")));
        assert!(policy.host_allowed(Some("api.internal")));
        assert!(!policy.host_allowed(Some("internal")));
        assert!(!policy.host_allowed(Some("evil.example.com")));
        assert!(!policy.host_allowed(None));
    }

    #[test]
    fn test_wildcard_needs_a_dot() {
        let config = SecurityConfig {
            trusted_hosts: vec!["*example.com".into()],
            ..SecurityConfig::default()
        };
        let policy = SecurityPolicy::new(&config, false);
        assert!(!policy.host_allowed(Some("evilexample.com")));
        assert!(!policy.host_allowed(Some("api.example.com")));
    }

    #[tokio::test]
    async fn test_untrusted_host_rejected() {
        let config = SecurityConfig {
            trusted_hosts: vec!["kyc.example.com".into()],
            ..SecurityConfig::default()
        };
        let response = app(config, false)
            .oneshot(request("attacker.example", "/pancard/x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_http_redirected_to_https() {
        let config = SecurityConfig {
            https_redirect: true,
            ..SecurityConfig::default()
        };
        let response = app(config, false)
            .oneshot(request("kyc.example.com:80", "/bankaccount/verify?id=7"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()["location"],
            "https://kyc.example.com/bankaccount/verify?id=7"
        );
    }

    #[tokio::test]
    async fn test_forwarded_https_not_redirected() {
        let config = SecurityConfig {
            https_redirect: true,
            ..SecurityConfig::default()
        };
        let response = app(config, false)
            .oneshot(
                Request::builder()
                    .uri("/bankaccount/verify")
                    .header("host", "kyc.example.com")
                    .header("x-forwarded-proto", "https")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_tls_listener_not_redirected() {
        let config = SecurityConfig {
            https_redirect: true,
            ..SecurityConfig::default()
        };
        let response = app(config, true)
            .oneshot(request("kyc.example.com", "/pancard/x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
