//! KYC verification gateway library.

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routes;

pub use app::{Gateway, LaunchError};
pub use config::schema::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use routes::RouteGroups;
