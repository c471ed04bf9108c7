//! Cross-origin policy.
//!
//! `"*"` cannot be sent together with `Access-Control-Allow-Credentials`,
//! so when credentials are allowed a wildcard list echoes back whatever the
//! request asked for instead.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

fn is_wildcard(list: &[String]) -> bool {
    list.iter().any(|v| v == "*")
}

/// Build the CORS layer described by `config`.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let credentials = config.allow_credentials;

    let origins = if is_wildcard(&config.allow_origins) {
        if credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        }
    } else {
        AllowOrigin::list(
            config
                .allow_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    let methods = if is_wildcard(&config.allow_methods) {
        if credentials {
            AllowMethods::mirror_request()
        } else {
            AllowMethods::any()
        }
    } else {
        AllowMethods::list(
            config
                .allow_methods
                .iter()
                .filter_map(|m| Method::from_bytes(m.as_bytes()).ok()),
        )
    };

    let headers = if is_wildcard(&config.allow_headers) {
        if credentials {
            AllowHeaders::mirror_request()
        } else {
            AllowHeaders::any()
        }
    } else {
        AllowHeaders::list(
            config
                .allow_headers
                .iter()
                .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(credentials)
        .max_age(Duration::from_secs(config.max_age_secs))
}

/// True when every origin may call the gateway with cookies or auth headers.
pub fn is_fully_permissive(config: &CorsConfig) -> bool {
    config.allow_credentials && is_wildcard(&config.allow_origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app(config: &CorsConfig) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(cors_layer(config))
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method("OPTIONS")
            .uri("/")
            .header("origin", origin)
            .header("access-control-request-method", "DELETE")
            .header("access-control-request-headers", "x-custom-token")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_default_policy_mirrors_any_origin() {
        let config = CorsConfig::default();
        assert!(is_fully_permissive(&config));

        for origin in ["https://a.example", "http://localhost:3000", "null"] {
            let response = app(&config).oneshot(preflight(origin)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let headers = response.headers();
            assert_eq!(headers["access-control-allow-origin"], origin);
            assert_eq!(headers["access-control-allow-credentials"], "true");
            assert_eq!(headers["access-control-allow-methods"], "DELETE");
            assert_eq!(headers["access-control-allow-headers"], "x-custom-token");
        }
    }

    #[tokio::test]
    async fn test_explicit_origin_list() {
        let config = CorsConfig {
            allow_origins: vec!["https://app.example.com".into()],
            allow_methods: vec!["GET".into(), "POST".into()],
            ..CorsConfig::default()
        };
        assert!(!is_fully_permissive(&config));

        let allowed = app(&config)
            .oneshot(preflight("https://app.example.com"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers()["access-control-allow-origin"],
            "https://app.example.com"
        );

        let denied = app(&config)
            .oneshot(preflight("https://evil.example"))
            .await
            .unwrap();
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_wildcard_without_credentials_sends_star() {
        let config = CorsConfig {
            allow_credentials: false,
            ..CorsConfig::default()
        };
        let response = app(&config)
            .oneshot(preflight("https://anywhere.example"))
            .await
            .unwrap();
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert!(response
            .headers()
            .get("access-control-allow-credentials")
            .is_none());
    }
}
