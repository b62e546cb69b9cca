//! Station configuration
//!
//! Loads the station configuration from TOML: the arm address, the recipe,
//! and the script the simulated controller follows.

pub mod loader;

use pisco_core::sequence::Recipe;
use pisco_drivers::sim::{SimArm, SimError, SimEvent, SimPacing};
use pisco_hal::ControllerState;
use serde::Deserialize;

pub use loader::load;

/// Default duration of a simulated move
const DEFAULT_MOTION_MS: u32 = 800;

/// Top-level station configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub arm: ArmConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    pub recipe: Recipe,
}

/// Arm controller connection
#[derive(Debug, Clone, Deserialize)]
pub struct ArmConfig {
    /// Controller address
    pub address: String,
}

/// Simulated controller script
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Let simulated time pass at wall-clock speed
    #[serde(default)]
    pub realtime: bool,
    /// Duration of each move (ms)
    #[serde(default = "default_motion_ms")]
    pub motion_ms: u32,
    /// Publish a controller counter
    #[serde(default)]
    pub counter: bool,
    /// Input level timelines
    #[serde(default)]
    pub input: Vec<InputConfig>,
    /// Controller events
    #[serde(default)]
    pub event: Vec<EventConfig>,
}

fn default_motion_ms() -> u32 {
    DEFAULT_MOTION_MS
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            realtime: false,
            motion_ms: DEFAULT_MOTION_MS,
            counter: false,
            input: Vec::new(),
            event: Vec::new(),
        }
    }
}

/// Level timeline of one controller input
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub channel: u8,
    #[serde(default)]
    pub initial: bool,
    #[serde(default)]
    pub changes: Vec<LevelChange>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LevelChange {
    pub at_ms: u64,
    pub level: bool,
}

/// Controller event at a point in time
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EventConfig {
    pub at_ms: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    Fault { code: u16 },
    State { state: ControllerState },
    Disconnect,
    Count { value: u32 },
}

impl From<EventKind> for SimEvent {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Fault { code } => SimEvent::Fault(code),
            EventKind::State { state } => SimEvent::State(state),
            EventKind::Disconnect => SimEvent::Disconnect,
            EventKind::Count { value } => SimEvent::Count(value),
        }
    }
}

impl SimulationConfig {
    /// Build the simulated controller this script describes
    pub fn build<'a, P: SimPacing>(&self, pacing: P) -> Result<SimArm<'a, P>, SimError> {
        let mut arm = SimArm::new(pacing).with_motion_ms(self.motion_ms);
        if self.counter {
            arm = arm.with_counter(0);
        }

        for input in &self.input {
            arm.set_input(input.channel, input.initial)?;
            for change in &input.changes {
                arm.script_input(input.channel, change.at_ms, change.level)?;
            }
        }

        for event in &self.event {
            arm.schedule(event.at_ms, event.kind.into())?;
        }

        Ok(arm)
    }
}
