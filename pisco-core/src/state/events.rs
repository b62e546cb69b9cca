//! Events that trigger run state transitions

use super::machine::ErrorKind;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Lifecycle events
    /// Session opened and notification handlers registered
    SessionReady,
    /// Session closed and handlers released
    Teardown,

    // Sequencer events
    /// Recipe execution started
    Start,
    /// A sensor-gated wait started blocking the sequence
    SensorWaitStarted,
    /// The sensor-gated wait produced an outcome
    SensorWaitFinished,
    /// Every recipe step executed
    SequenceFinished,

    // Safety events
    /// Liveness lost or a command rejected
    ErrorDetected(ErrorKind),
}
