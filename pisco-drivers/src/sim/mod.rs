//! Simulated arm controller
//!
//! Stands in for the vendor controller on the bench and in tests. Time is
//! owned by a [`SimPacing`] clock: every command the arm executes advances
//! it, and controller events scheduled on the timeline are applied (and
//! pushed to subscribers) as it passes.

pub mod arm;
pub mod clock;
pub mod delay;
pub mod script;

pub use arm::{Command, SimArm, SimError, MAX_COMMAND_LOG};
pub use clock::{ManualClock, SimPacing};
pub use delay::SimDelay;
pub use script::{InputScript, SimEvent, MAX_EVENTS, MAX_INPUTS, MAX_INPUT_EDGES};
