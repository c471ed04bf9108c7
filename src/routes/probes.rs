//! Built-in endpoints: greeting, liveness, readiness, 404.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Body of `GET /`.
pub const GREETING: &str = "<h1> Hi there. 🥳</h1> ";

/// Smoke test that the gateway is deployed.
pub async fn index() -> Html<&'static str> {
    Html(GREETING)
}

/// Liveness. Always healthy while the process runs: the cache is only
/// checked at startup, so this cannot see it go away later. Use `/ready`
/// for that.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// Readiness. Re-checks the cache on every call.
pub async fn ready(State(state): State<AppState>) -> Response {
    match state.checker.check_connection().await {
        Ok(()) => {
            metrics::record_cache_check(true);
            Json(json!({ "status": "ready" })).into_response()
        }
        Err(e) => {
            metrics::record_cache_check(false);
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "reason": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub async fn not_found() -> GatewayError {
    GatewayError::NotFound
}
