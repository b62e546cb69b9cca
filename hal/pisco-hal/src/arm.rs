//! Arm session status and setup
//!
//! Read accessors for the controller-reported session state, plus the
//! preparation commands issued once when a session opens.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::gpio::{DigitalInput, DigitalOutput};
use crate::motion::Motion;

/// Controller-reported execution state
///
/// Discriminants match the numeric codes the controller reports. Every
/// state ranked below [`ControllerState::Stopped`] accepts commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum ControllerState {
    /// Executing a motion
    Moving = 1,
    /// Ready, no motion queued
    Idle = 2,
    /// Motion suspended, resumable
    Paused = 3,
    /// Stopped; the controller will not accept further motion
    Stopped = 4,
    /// Transitioning between modes; transient
    Settling = 5,
    /// Controller-side error state
    Error = 6,
}

impl ControllerState {
    /// Get the numeric code reported by the controller
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Decode a controller-reported state code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ControllerState::Moving),
            2 => Some(ControllerState::Idle),
            3 => Some(ControllerState::Paused),
            4 => Some(ControllerState::Stopped),
            5 => Some(ControllerState::Settling),
            6 => Some(ControllerState::Error),
            _ => None,
        }
    }

    /// Check if this state ranks below the stop threshold
    pub fn accepts_commands(self) -> bool {
        self < ControllerState::Stopped
    }
}

/// Nonzero return code from a controller command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArmError {
    /// Raw controller return code
    pub code: i32,
}

impl ArmError {
    /// Wrap a raw controller return code
    pub const fn new(code: i32) -> Self {
        Self { code }
    }

    /// Convert a raw return code into a result (0 = success)
    pub fn check(code: i32) -> Result<(), ArmError> {
        if code == 0 {
            Ok(())
        } else {
            Err(ArmError { code })
        }
    }
}

impl fmt::Display for ArmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller returned code {}", self.code)
    }
}

/// Polled read accessors for the session state
///
/// Takes `&mut self` because a networked controller may refresh its cached
/// report on access.
pub trait ArmStatus {
    /// Check if the controller connection is up
    fn is_connected(&mut self) -> bool;

    /// Get the current fault code (0 = no fault)
    fn error_code(&mut self) -> u16;

    /// Get the current controller execution state
    fn controller_state(&mut self) -> ControllerState;
}

/// One-shot preparation commands issued when a session opens
pub trait ArmSetup {
    /// Clear latched warnings
    fn clear_warnings(&mut self) -> Result<(), ArmError>;

    /// Clear latched errors
    fn clear_errors(&mut self) -> Result<(), ArmError>;

    /// Enable or disable the servo motors
    fn enable_motion(&mut self, enabled: bool) -> Result<(), ArmError>;

    /// Select the controller motion mode (0 = position mode)
    fn set_mode(&mut self, mode: u8) -> Result<(), ArmError>;

    /// Request a controller state (0 = ready to move)
    fn set_state(&mut self, state: u8) -> Result<(), ArmError>;
}

/// Complete arm controller surface used by the sequencer
pub trait Arm: ArmStatus + ArmSetup + DigitalInput + DigitalOutput + Motion {}

// Blanket implementation for types that implement every capability
impl<T: ArmStatus + ArmSetup + DigitalInput + DigitalOutput + Motion + ?Sized> Arm for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes_round_trip() {
        for code in 1..=6 {
            let state = ControllerState::from_code(code).unwrap();
            assert_eq!(state.code(), code);
        }
        assert_eq!(ControllerState::from_code(0), None);
        assert_eq!(ControllerState::from_code(7), None);
    }

    #[test]
    fn test_accepts_commands_below_stopped() {
        assert!(ControllerState::Moving.accepts_commands());
        assert!(ControllerState::Idle.accepts_commands());
        assert!(ControllerState::Paused.accepts_commands());
        assert!(!ControllerState::Stopped.accepts_commands());
        assert!(!ControllerState::Settling.accepts_commands());
        assert!(!ControllerState::Error.accepts_commands());
    }

    #[test]
    fn test_check_code() {
        assert_eq!(ArmError::check(0), Ok(()));
        assert_eq!(ArmError::check(9), Err(ArmError::new(9)));
    }
}
