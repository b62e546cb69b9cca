//! Scripted controller timelines

use heapless::Vec;
use pisco_hal::ControllerState;

/// Controller digital inputs (CI0..CI7)
pub const MAX_INPUTS: usize = 8;
/// Level changes per input script
pub const MAX_INPUT_EDGES: usize = 32;
/// Pending controller events
pub const MAX_EVENTS: usize = 16;

/// Level timeline of one digital input
#[derive(Debug, Clone, Default)]
pub struct InputScript {
    initial: bool,
    /// `(at_ms, level)` in ascending time order
    edges: Vec<(u64, bool), MAX_INPUT_EDGES>,
}

impl InputScript {
    pub fn new(initial: bool) -> Self {
        Self {
            initial,
            edges: Vec::new(),
        }
    }

    /// Add a level change at `at_ms`
    ///
    /// Edges may be added in any order. Returns false when the script is full.
    pub fn push(&mut self, at_ms: u64, level: bool) -> bool {
        let pos = self
            .edges
            .iter()
            .position(|&(t, _)| t > at_ms)
            .unwrap_or(self.edges.len());
        self.edges.insert(pos, (at_ms, level)).is_ok()
    }

    /// Level in effect at `now_ms`
    pub fn level_at(&self, now_ms: u64) -> bool {
        self.edges
            .iter()
            .take_while(|&&(t, _)| t <= now_ms)
            .last()
            .map_or(self.initial, |&(_, level)| level)
    }
}

/// Controller-side event on the simulation timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimEvent {
    /// Controller raises (or clears, with 0) a fault code
    Fault(u16),
    /// Controller changes execution state
    State(ControllerState),
    /// Connection drops
    Disconnect,
    /// Controller counter changes
    Count(u32),
}
