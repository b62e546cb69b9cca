//! Recipe steps

use heapless::String;
use pisco_hal::{MotionParams, Pose};

use crate::config::MAX_LABEL_LEN;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One recipe operation
///
/// In TOML each step is a single-key table naming the operation, e.g.
/// `{ move_line = { pose = [300.0, 0.0, 150.0, 180.0, 0.0, 0.0] } }`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Step {
    /// Linear move to a pose
    MoveLine { pose: Pose },
    /// Circular move through `via` to `end`, covering `percent` of the circle
    MoveCircle { via: Pose, end: Pose, percent: f32 },
    /// Set a controller digital output
    ControllerOutput { index: u8, level: bool },
    /// Set a tool digital output
    ToolOutput { index: u8, level: bool },
    /// Controller-side pause
    Pause { seconds: f32 },
    /// Override motion parameters for the following moves
    Speed {
        #[cfg_attr(feature = "serde", serde(default))]
        tcp_speed: Option<f32>,
        #[cfg_attr(feature = "serde", serde(default))]
        tcp_acc: Option<f32>,
        #[cfg_attr(feature = "serde", serde(default))]
        angle_speed: Option<f32>,
        #[cfg_attr(feature = "serde", serde(default))]
        angle_acc: Option<f32>,
    },
    /// Block on a named sensor gate
    WaitSensor { gate: String<MAX_LABEL_LEN> },
}

impl Step {
    /// Operation name used in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            Step::MoveLine { .. } => "move_line",
            Step::MoveCircle { .. } => "move_circle",
            Step::ControllerOutput { .. } => "controller_output",
            Step::ToolOutput { .. } => "tool_output",
            Step::Pause { .. } => "pause",
            Step::Speed { .. } => "speed",
            Step::WaitSensor { .. } => "wait_sensor",
        }
    }

    /// Apply a `Speed` step to `params`; other steps leave them untouched
    pub fn apply_speed(&self, params: &mut MotionParams) {
        if let Step::Speed {
            tcp_speed,
            tcp_acc,
            angle_speed,
            angle_acc,
        } = self
        {
            if let Some(v) = tcp_speed {
                params.tcp_speed = *v;
            }
            if let Some(v) = tcp_acc {
                params.tcp_acc = *v;
            }
            if let Some(v) = angle_speed {
                params.angle_speed = *v;
            }
            if let Some(v) = angle_acc {
                params.angle_acc = *v;
            }
        }
    }
}
