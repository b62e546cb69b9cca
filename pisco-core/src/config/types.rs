//! Configuration type definitions
//!
//! These types describe the station configuration: named sensor gates and
//! the recipe that references them. They are loaded from TOML by the station
//! and stored in fixed-capacity `heapless` containers.

use heapless::String;

use crate::sensor::{
    secs_to_ms, WaitConfig, DEFAULT_DEBOUNCE_MS, DEFAULT_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum sensor gates per recipe
pub const MAX_GATES: usize = 8;

/// Maximum steps per recipe
pub const MAX_STEPS: usize = 192;

/// What a run does when a gate times out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TimeoutPolicy {
    /// Log and carry on with the next step
    #[default]
    Continue,
    /// Halt the run
    Halt,
}

/// Sensor gate configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorGate {
    /// Gate name, referenced by `wait_sensor` steps
    pub name: String<MAX_LABEL_LEN>,
    /// Controller digital input index
    pub channel: u8,
    /// Level that releases the gate
    pub satisfied_level: bool,
    /// Timeout in seconds; negative values clamp to zero
    pub timeout_s: f32,
    /// Time the satisfied level must hold (ms)
    #[cfg_attr(feature = "serde", serde(default = "default_debounce_ms"))]
    pub debounce_ms: u32,
    /// Poll tick (ms), at most `MAX_POLL_INTERVAL_MS`
    #[cfg_attr(feature = "serde", serde(default = "default_poll_ms"))]
    pub poll_ms: u32,
    /// Timeout handling
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_timeout: TimeoutPolicy,
}

#[cfg(feature = "serde")]
fn default_debounce_ms() -> u32 {
    DEFAULT_DEBOUNCE_MS
}

#[cfg(feature = "serde")]
fn default_poll_ms() -> u32 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for SensorGate {
    fn default() -> Self {
        Self {
            name: String::new(),
            channel: 0,
            satisfied_level: false,
            timeout_s: 5.0,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            poll_ms: DEFAULT_POLL_INTERVAL_MS,
            on_timeout: TimeoutPolicy::Continue,
        }
    }
}

impl SensorGate {
    /// Wait parameters for this gate
    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig::new(self.channel, self.satisfied_level, secs_to_ms(self.timeout_s))
            .with_debounce_ms(self.debounce_ms)
            .with_poll_interval_ms(self.poll_ms.clamp(1, MAX_POLL_INTERVAL_MS))
    }
}
