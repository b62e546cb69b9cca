//! Arm session liveness
//!
//! Answers "is it still safe to command the arm?" and owns the
//! subscription lifecycle of the controller notification handlers.

pub mod lifecycle;
pub mod monitor;

pub use lifecycle::{Session, SETUP_SETTLE_MS};
pub use monitor::{LivenessMonitor, SETTLE_POLL_ATTEMPTS, SETTLE_POLL_INTERVAL_MS};
