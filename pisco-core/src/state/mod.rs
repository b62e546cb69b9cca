//! State machine for recipe execution
//!
//! Defines the authoritative run lifecycle of a bartender session.
//! The state machine is explicit, finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::{ErrorKind, RunState};
