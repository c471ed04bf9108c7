//! Network layer.
//!
//! Plain TCP is bound directly by `Gateway::run`; this module only covers
//! the optional TLS listener, terminated in-process with rustls.

pub mod tls;

pub use tls::{load_tls_config, TlsError};
