//! Forwarding a route group to the service that owns it.
//!
//! The group's prefix is already stripped by `Router::nest`, so
//! `/pancard/verify?x=1` reaches the upstream as `<base>/verify?x=1`.
//! Bodies are streamed in both directions.

use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Uri, Version};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::error::GatewayError;
use crate::observability::metrics;

/// Pooled client shared by both route groups.
pub type HttpClient = Client<HttpConnector, Body>;

pub const X_FORWARDED_PREFIX: &str = "x-forwarded-prefix";

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub fn http_client(connect_timeout: Duration) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(connect_timeout));
    Client::builder(TokioExecutor::new()).build(connector)
}

/// One mounted group and where its traffic goes.
#[derive(Clone)]
struct Upstream {
    group: &'static str,
    prefix: &'static str,
    base: Url,
    client: HttpClient,
    timeout: Duration,
}

impl Upstream {
    fn target(&self, path_and_query: &str) -> Result<Uri, GatewayError> {
        let base = self.base.as_str().trim_end_matches('/');
        format!("{}{}", base, path_and_query).parse().map_err(|e| {
            tracing::error!(group = self.group, error = %e, "Could not build upstream URI");
            GatewayError::Internal
        })
    }
}

/// Router for a group whose upstream may not be configured.
///
/// Without a base URL every request under the prefix answers 503.
pub fn forwarding_router(
    group: &'static str,
    prefix: &'static str,
    base: Option<&str>,
    client: HttpClient,
    timeout: Duration,
) -> Router {
    let Some(base) = base.and_then(|b| Url::parse(b).ok()) else {
        tracing::warn!(group, prefix, "No upstream configured; group will answer 503");
        let unconfigured = move || async move { GatewayError::NotConfigured(group) };
        return Router::new()
            .route("/", any(unconfigured))
            .route("/{*path}", any(unconfigured));
    };

    tracing::info!(group, prefix, upstream = %base, "Route group mounted");
    Router::new()
        .route("/", any(forward))
        .route("/{*path}", any(forward))
        .with_state(Upstream {
            group,
            prefix,
            base,
            client,
            timeout,
        })
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

async fn forward(State(upstream): State<Upstream>, request: Request) -> Result<Response, GatewayError> {
    let (mut parts, body) = request.into_parts();

    let path_and_query = parts.uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    parts.uri = upstream.target(path_and_query)?;
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);
    parts.headers.remove(header::HOST);
    parts.headers.insert(
        X_FORWARDED_PREFIX,
        HeaderValue::from_static(upstream.prefix),
    );

    tracing::debug!(group = upstream.group, uri = %parts.uri, "Forwarding request");

    let request = Request::from_parts(parts, body);
    match tokio::time::timeout(upstream.timeout, upstream.client.request(request)).await {
        Ok(Ok(response)) => Ok(relay(response)),
        Ok(Err(e)) => {
            tracing::error!(group = upstream.group, error = %e, "Upstream error");
            metrics::record_upstream_error(upstream.group, "connect");
            Err(GatewayError::UpstreamUnavailable(upstream.group))
        }
        Err(_) => {
            tracing::error!(group = upstream.group, timeout = ?upstream.timeout, "Upstream timed out");
            metrics::record_upstream_error(upstream.group, "timeout");
            Err(GatewayError::UpstreamTimeout(upstream.group))
        }
    }
}

fn relay(response: hyper::Response<Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[test]
    fn test_target_joins_base_path() {
        let upstream = Upstream {
            group: "pancard verification",
            prefix: "/pancard",
            base: Url::parse("http://127.0.0.1:9001/api/").unwrap(),
            client: http_client(Duration::from_secs(1)),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(
            upstream.target("/verify?pan=ABCDE1234F").unwrap(),
            "http://127.0.0.1:9001/api/verify?pan=ABCDE1234F"
        );
        assert_eq!(upstream.target("/").unwrap(), "http://127.0.0.1:9001/api/");
    }

    #[test]
    fn test_hop_by_hop_removed() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        strip_hop_by_hop(&mut headers);
        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::CONTENT_TYPE));
    }

    #[tokio::test]
    async fn test_unconfigured_group_answers_503() {
        let router = forwarding_router(
            "bank account verification",
            "/bankaccount",
            None,
            http_client(Duration::from_secs(1)),
            Duration::from_secs(1),
        );
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/verify")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_dead_upstream_is_bad_gateway() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let base = format!("http://127.0.0.1:{}", port);
        let router = forwarding_router(
            "pancard verification",
            "/pancard",
            Some(&base),
            http_client(Duration::from_secs(1)),
            Duration::from_secs(2),
        );
        let response = router
            .oneshot(Request::builder().uri("/x").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
