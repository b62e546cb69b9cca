//! Digital I/O abstractions
//!
//! The arm controller exposes two banks of numbered digital channels:
//! controller I/O (cabinet connectors wired to sensors and dispensers) and
//! tool I/O (the end-effector connector driving the gripper lid).

use crate::arm::ArmError;

/// Numbered digital inputs on the controller cabinet
///
/// The I/O subsystem is owned by the controller; readers only sample it.
pub trait DigitalInput {
    /// Read the level of a controller input (true = logic 1)
    fn read_input(&mut self, index: u8) -> Result<bool, ArmError>;
}

/// Numbered digital outputs on the controller cabinet and the tool
pub trait DigitalOutput {
    /// Drive a controller output to a specific level
    fn set_controller_output(&mut self, index: u8, high: bool) -> Result<(), ArmError>;

    /// Drive a tool (end-effector) output to a specific level
    fn set_tool_output(&mut self, index: u8, high: bool) -> Result<(), ArmError>;
}
