//! Sensor-gated waits
//!
//! Blocks a recipe until a digital input reports a stable level, bounded by
//! a timeout that restarts whenever the input leaves that level.

pub mod wait;

pub use wait::{
    secs_to_ms, wait_for_sensor, AbortReason, Reading, SensorWait, WaitConfig, WaitOutcome,
    WaitPhase, DEFAULT_DEBOUNCE_MS, DEFAULT_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS,
};
