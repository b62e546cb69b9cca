//! Session open/close
//!
//! Prepares the controller for commanding and wires the liveness monitor to
//! its push notifications for the duration of a run.

use embedded_hal::delay::DelayNs;
use pisco_hal::{ArmError, ArmSetup, NotificationSource, Topic};

use super::monitor::LivenessMonitor;

/// Settle time after the setup sequence, before the first command
pub const SETUP_SETTLE_MS: u32 = 1000;

/// Motion mode written during setup (position control)
const SETUP_MODE: u8 = 0;
/// Controller state written during setup (ready)
const SETUP_STATE: u8 = 0;

/// An open arm session
///
/// Tracks which notification topics it subscribed so that [`Session::close`]
/// releases exactly those.
#[derive(Debug)]
pub struct Session<'m> {
    monitor: &'m LivenessMonitor,
    subscribed: [bool; 3],
}

impl<'m> Session<'m> {
    /// Prepare the controller and register the monitor's handlers
    ///
    /// Clears warnings and errors, enables motion, selects position mode and
    /// the ready state, then waits [`SETUP_SETTLE_MS`]. The fault and state
    /// handlers are always registered; the counter handler only when the
    /// controller publishes a counter.
    pub fn open<A, D>(
        monitor: &'m LivenessMonitor,
        arm: &mut A,
        delay: &mut D,
    ) -> Result<Self, ArmError>
    where
        A: ArmSetup + NotificationSource<'m> + ?Sized,
        D: DelayNs,
    {
        arm.clear_warnings()?;
        arm.clear_errors()?;
        arm.enable_motion(true)?;
        arm.set_mode(SETUP_MODE)?;
        arm.set_state(SETUP_STATE)?;
        delay.delay_ms(SETUP_SETTLE_MS);

        let mut session = Self {
            monitor,
            subscribed: [false; 3],
        };

        for topic in Topic::ALL {
            if !arm.supports(topic) {
                log_debug!("Controller has no {:?} notifications", topic);
                continue;
            }

            if let Err(e) = arm.subscribe(topic, monitor) {
                log_error!("Subscribing to {:?} failed, code={}", topic, e.code);
                session.release(arm);
                return Err(e);
            }
            session.subscribed[topic.index()] = true;
        }

        log_info!("Session open");
        Ok(session)
    }

    /// Check whether this session registered a handler for `topic`
    pub fn is_subscribed(&self, topic: Topic) -> bool {
        self.subscribed[topic.index()]
    }

    /// Tear the session down
    ///
    /// Latches the monitor dead and unregisters every handler this session
    /// registered. Handlers that already detached themselves are skipped by
    /// the controller.
    pub fn close<A>(mut self, arm: &mut A)
    where
        A: NotificationSource<'m> + ?Sized,
    {
        self.monitor.mark_dead();
        self.release(arm);
        log_info!("Session closed");
    }

    fn release<A>(&mut self, arm: &mut A)
    where
        A: NotificationSource<'m> + ?Sized,
    {
        for topic in Topic::ALL {
            if !self.subscribed[topic.index()] {
                continue;
            }

            if let Err(e) = arm.unsubscribe(topic) {
                log_warn!("Unsubscribing from {:?} failed, code={}", topic, e.code);
            }
            self.subscribed[topic.index()] = false;
        }
    }
}
