//! Middleware stages.
//!
//! Outermost first, as wired by `server::build_router`:
//!
//! ```text
//! request id → trace span → access log → CORS → trusted host / HTTPS redirect
//!     → body limit → catch panic → timeout → routes
//! ```

pub mod cors;
pub mod logging;
pub mod security;

pub use cors::cors_layer;
pub use logging::{log_requests, AccessLog, RequestLogger, RequestRecord, TracingRequestLogger};
pub use security::{enforce_security, SecurityPolicy};
