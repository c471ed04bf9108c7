//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Check cache → Build router → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → on_shutdown → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: an unreachable cache is fatal and nothing is bound
//! - Listeners start last (traffic only when ready)
//! - Shutdown has a grace period: forced exit after deadline

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{on_shutdown, Shutdown};
pub use signals::shutdown_signal;
pub use startup::{on_startup, StartupError, StartupPolicy};
