//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware/ (access log, CORS, host and scheme checks)
//!     → request.rs (request ID, scheme/host/URL reconstruction)
//!     → routes (built-in probes or a mounted route group)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{build_router, AppState, GatewayServer, ServerError};
