//! State machine definition
//!
//! Every arm command the sequencer issues is a function of the current run
//! state and an event.

use core::fmt;

use pisco_hal::ArmStatus;

use super::events::Event;

/// Run states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    /// Session not yet prepared
    Boot,
    /// Session open, handlers registered, nothing commanded yet
    Ready,
    /// Recipe steps executing
    Running,
    /// Sequence blocked on a sensor-gated wait
    Gated,
    /// Every step executed
    Complete,
    /// Run stopped; the arm is no longer commanded
    Halted(ErrorKind),
    /// Session torn down
    Closed,
}

/// Reasons a run halts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Controller connection dropped
    ConnectivityLost,
    /// Controller raised a nonzero fault code
    FaultRaised(u16),
    /// Controller stopped or stuck outside the commandable states
    ControllerStopped,
    /// Sensor gate timed out and its policy halts the run
    Timeout,
    /// A command returned a nonzero code
    CommandRejected(i32),
    /// A step referenced a sensor gate the recipe does not define
    UnknownGate,
}

impl ErrorKind {
    /// Derive the halt reason from the controller-reported session state
    ///
    /// Used after liveness is lost without a more specific cause at hand.
    pub fn classify<A: ArmStatus + ?Sized>(arm: &mut A) -> Self {
        if !arm.is_connected() {
            return ErrorKind::ConnectivityLost;
        }

        let code = arm.error_code();
        if code != 0 {
            return ErrorKind::FaultRaised(code);
        }

        ErrorKind::ControllerStopped
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ConnectivityLost => write!(f, "controller connection lost"),
            ErrorKind::FaultRaised(code) => write!(f, "controller fault {}", code),
            ErrorKind::ControllerStopped => write!(f, "controller stopped"),
            ErrorKind::Timeout => write!(f, "sensor gate timed out"),
            ErrorKind::CommandRejected(code) => write!(f, "command rejected with code {}", code),
            ErrorKind::UnknownGate => write!(f, "unknown sensor gate"),
        }
    }
}

impl RunState {
    /// Check if this is a halted state
    pub fn is_halted(&self) -> bool {
        matches!(self, RunState::Halted(_))
    }

    /// Check if the run is over (successfully or not)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Complete | RunState::Halted(_) | RunState::Closed
        )
    }

    /// Process an event and return the next state
    ///
    /// This is the core state transition logic.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use RunState::*;

        match (self, event) {
            // Boot transitions
            (Boot, SessionReady) => Ready,
            (Boot, ErrorDetected(kind)) => Halted(kind),

            // Ready transitions
            (Ready, Start) => Running,
            (Ready, ErrorDetected(kind)) => Halted(kind),
            (Ready, Teardown) => Closed,

            // Running transitions
            (Running, SensorWaitStarted) => Gated,
            (Running, SequenceFinished) => Complete,
            (Running, ErrorDetected(kind)) => Halted(kind),

            // Gated transitions
            (Gated, SensorWaitFinished) => Running,
            (Gated, ErrorDetected(kind)) => Halted(kind),

            // Terminal transitions
            (Complete, Teardown) => Closed,
            (Halted(_), Teardown) => Closed,

            // Default: stay in current state
            _ => self,
        }
    }
}
