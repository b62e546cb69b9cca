//! Motion primitives
//!
//! Cartesian commands forwarded to the controller. Planning, kinematics and
//! blending all happen on the controller side; every command here blocks
//! until the controller reports the motion finished.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arm::ArmError;

/// Tool-center-point pose: x, y, z (mm) and roll, pitch, yaw (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose(pub [f32; 6]);

impl Pose {
    /// Create a pose from position (mm) and orientation (degrees)
    pub const fn new(x: f32, y: f32, z: f32, roll: f32, pitch: f32, yaw: f32) -> Self {
        Self([x, y, z, roll, pitch, yaw])
    }
}

/// Speed and acceleration limits applied to motion commands
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionParams {
    /// Linear TCP speed (mm/s)
    pub tcp_speed: f32,
    /// Linear TCP acceleration (mm/s²)
    pub tcp_acc: f32,
    /// Joint speed (°/s)
    pub angle_speed: f32,
    /// Joint acceleration (°/s²)
    pub angle_acc: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            tcp_speed: 100.0,
            tcp_acc: 2000.0,
            angle_speed: 20.0,
            angle_acc: 500.0,
        }
    }
}

/// Trait for controllers accepting Cartesian motion commands
pub trait Motion {
    /// Move the TCP in a straight line to `pose`
    fn move_line(&mut self, pose: &Pose, params: &MotionParams) -> Result<(), ArmError>;

    /// Move along the circle through `via` and `end`
    ///
    /// `percent` is the arc length as a percentage of the full circle
    /// (200.0 = two full turns).
    fn move_circle(
        &mut self,
        via: &Pose,
        end: &Pose,
        percent: f32,
        params: &MotionParams,
    ) -> Result<(), ArmError>;

    /// Queue a controller-side pause
    fn pause(&mut self, duration_ms: u32) -> Result<(), ArmError>;
}
