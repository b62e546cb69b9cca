//! Liveness monitor implementation
//!
//! Aggregates controller connectivity, fault code and execution state into a
//! single "safe to command" answer. Catastrophic transitions are pushed by the
//! controller (fault, stop) and latch the session dead; everything else is
//! pulled on demand before and during every commanded operation.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;
use pisco_hal::{ArmError, ArmStatus, ControllerState, Disposition, Notification, NotificationSink};

/// Maximum re-polls while the controller reports a settling state
pub const SETTLE_POLL_ATTEMPTS: u8 = 5;
/// Delay between settling re-polls
pub const SETTLE_POLL_INTERVAL_MS: u32 = 100;

/// Liveness monitor for one arm session
///
/// The only shared mutable state is the `alive` latch. It moves from true to
/// false exactly once and is written by notification handlers that may run
/// on the controller's thread, so a plain atomic flag suffices.
#[derive(Debug)]
pub struct LivenessMonitor {
    /// False once any terminal event has been observed
    alive: AtomicBool,
}

impl Default for LivenessMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LivenessMonitor {
    /// Create a monitor for a fresh session
    pub const fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
        }
    }

    /// Check the latch without consulting the controller
    pub fn is_marked_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Latch the session dead; there is no way back
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Check if it is still safe to command the arm
    ///
    /// Returns false immediately when the latch is set, the controller is
    /// disconnected or reports a fault. While the controller is settling,
    /// re-polls its state up to [`SETTLE_POLL_ATTEMPTS`] times, every
    /// [`SETTLE_POLL_INTERVAL_MS`], before deciding. Never fails.
    pub fn is_alive<A, D>(&self, arm: &mut A, delay: &mut D) -> bool
    where
        A: ArmStatus + ?Sized,
        D: DelayNs,
    {
        if !self.is_marked_alive() || !arm.is_connected() || arm.error_code() != 0 {
            return false;
        }

        let mut state = arm.controller_state();
        let mut attempts = 0;
        while state == ControllerState::Settling && attempts < SETTLE_POLL_ATTEMPTS {
            attempts += 1;
            delay.delay_ms(SETTLE_POLL_INTERVAL_MS);
            state = arm.controller_state();
        }

        state.accepts_commands()
    }

    /// Vet the result of a commanded operation
    ///
    /// A rejected command, or a session that died while it ran, latches the
    /// session dead and emits one diagnostic carrying the full controller
    /// status. Returns whether the sequence may continue.
    pub fn check_result<A, D>(
        &self,
        arm: &mut A,
        delay: &mut D,
        result: Result<(), ArmError>,
        label: &str,
    ) -> bool
    where
        A: ArmStatus + ?Sized,
        D: DelayNs,
    {
        if self.is_alive(arm, delay) && result.is_ok() {
            return true;
        }

        self.mark_dead();

        let code = match result {
            Ok(()) => 0,
            Err(e) => e.code,
        };
        let connected = arm.is_connected();
        let state = arm.controller_state();
        let fault = arm.error_code();
        log_error!(
            "{}, code={}, connected={}, state={:?}, error={}",
            label,
            code,
            connected,
            state,
            fault
        );

        false
    }

    /// Handle a fault code change pushed by the controller
    pub fn on_fault_changed(&self, code: u16) -> Disposition {
        if code == 0 {
            return Disposition::Keep;
        }

        self.mark_dead();
        log_warn!("err={}, quit", code);
        Disposition::Detach
    }

    /// Handle an execution state change pushed by the controller
    pub fn on_state_changed(&self, state: ControllerState) -> Disposition {
        if state != ControllerState::Stopped {
            return Disposition::Keep;
        }

        self.mark_dead();
        log_warn!("state={}, quit", state.code());
        Disposition::Detach
    }

    /// Handle a counter change pushed by the controller
    ///
    /// Purely observational.
    pub fn on_count_changed(&self, count: u32) -> Disposition {
        if self.is_marked_alive() {
            log_info!("counter val: {}", count);
        }
        Disposition::Keep
    }
}

impl NotificationSink for LivenessMonitor {
    fn notify(&self, notification: Notification) -> Disposition {
        match notification {
            Notification::Fault { code } => self.on_fault_changed(code),
            Notification::State(state) => self.on_state_changed(state),
            Notification::Count(count) => self.on_count_changed(count),
        }
    }
}
