//! HTTP-facing errors.
//!
//! Every error leaves the gateway as `{"detail": "..."}` with a matching
//! status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Not Found")]
    NotFound,

    #[error("Invalid host header")]
    InvalidHost,

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("{0} is unavailable")]
    UpstreamUnavailable(&'static str),

    #[error("{0} timed out")]
    UpstreamTimeout(&'static str),

    #[error("Internal Server Error")]
    Internal,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::InvalidHost => StatusCode::BAD_REQUEST,
            GatewayError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "detail": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
