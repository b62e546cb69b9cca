//! Sensor-gated wait state machine
//!
//! The wait is split into a pure, clock-free state machine ([`SensorWait`])
//! and a blocking driver ([`wait_for_sensor`]) that feeds it one reading per
//! poll tick.
//!
//! ```text
//!            armed level                satisfied level
//!   Unarmed ─────────────► Armed ◄──────────────────────► Pending
//!      │                     │      (re-arm on return)       │
//!      │ satisfied           │ armed for >= timeout          │ held >= debounce
//!      ▼                     ▼                               ▼
//!  Satisfied              TimedOut                        Satisfied
//! ```
//!
//! Any phase aborts on the tick liveness is lost or an input read fails.

use embedded_hal::delay::DelayNs;
use pisco_hal::{ArmError, ArmStatus, Clock, DigitalInput};

use crate::session::LivenessMonitor;

/// Time the satisfied level must hold before a wait releases
pub const DEFAULT_DEBOUNCE_MS: u32 = 100;
/// Poll tick of the blocking driver
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 10;
/// Longest poll tick; bounds how late a lost session is noticed
pub const MAX_POLL_INTERVAL_MS: u32 = 100;

/// Parameters of one gated wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaitConfig {
    /// Controller digital input index
    pub channel: u8,
    /// Level that releases the wait
    pub satisfied_level: bool,
    /// Maximum time the input may sit at the armed level
    pub timeout_ms: u32,
    /// Time the satisfied level must hold (0 = release immediately)
    pub debounce_ms: u32,
    /// Poll tick, clamped to `1..=MAX_POLL_INTERVAL_MS` when waiting
    pub poll_interval_ms: u32,
}

impl WaitConfig {
    pub const fn new(channel: u8, satisfied_level: bool, timeout_ms: u32) -> Self {
        Self {
            channel,
            satisfied_level,
            timeout_ms,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    pub const fn with_debounce_ms(mut self, debounce_ms: u32) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub const fn with_poll_interval_ms(mut self, poll_interval_ms: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Level that keeps the wait blocked
    pub const fn armed_level(&self) -> bool {
        !self.satisfied_level
    }

    /// Poll tick actually slept between reads
    pub fn poll_tick_ms(&self) -> u32 {
        self.poll_interval_ms.clamp(1, MAX_POLL_INTERVAL_MS)
    }
}

/// One observation fed to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reading {
    /// Input level read while the session was alive
    Level(bool),
    /// Liveness lost; the input was not read
    Dead,
    /// The controller rejected the input read
    ReadFailed(ArmError),
}

/// Why a wait was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AbortReason {
    LivenessLost,
    InputRead(ArmError),
}

/// Result of a gated wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitOutcome {
    /// Input reached and held the satisfied level
    Satisfied,
    /// Input stayed at the armed level for the full timeout
    TimedOut,
    /// Wait abandoned before either happened
    Aborted(AbortReason),
}

/// Phase of a gated wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitPhase {
    /// Nothing read yet
    Unarmed,
    /// Input at the armed level, waiting for it to go pending.
    /// Times out once `timeout_ms` elapses after `armed_at_ms`.
    Armed { armed_at_ms: u64 },
    /// Input at the satisfied level since `since_ms`, waiting for it to
    /// hold or to drop back to the armed level
    Pending { since_ms: u64 },
    /// Outcome decided; further polls return it unchanged
    Done(WaitOutcome),
}

/// Clock-free gated wait state machine
#[derive(Debug, Clone)]
pub struct SensorWait {
    config: WaitConfig,
    phase: WaitPhase,
}

impl SensorWait {
    pub fn new(config: WaitConfig) -> Self {
        Self {
            config,
            phase: WaitPhase::Unarmed,
        }
    }

    pub fn config(&self) -> &WaitConfig {
        &self.config
    }

    pub fn phase(&self) -> WaitPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<WaitOutcome> {
        match self.phase {
            WaitPhase::Done(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Feed one reading taken at `now_ms`
    ///
    /// Returns the outcome once decided. After that the machine is inert.
    pub fn poll(&mut self, now_ms: u64, reading: Reading) -> Option<WaitOutcome> {
        if let WaitPhase::Done(outcome) = self.phase {
            return Some(outcome);
        }

        let level = match reading {
            Reading::Level(level) => level,
            Reading::Dead => {
                return self.finish(WaitOutcome::Aborted(AbortReason::LivenessLost));
            }
            Reading::ReadFailed(e) => {
                return self.finish(WaitOutcome::Aborted(AbortReason::InputRead(e)));
            }
        };
        let satisfied = level == self.config.satisfied_level;
        let phase = self.phase;

        match phase {
            WaitPhase::Unarmed if satisfied => self.finish(WaitOutcome::Satisfied),
            WaitPhase::Unarmed => self.arm(now_ms),
            WaitPhase::Armed { .. } if satisfied && self.config.debounce_ms == 0 => {
                self.finish(WaitOutcome::Satisfied)
            }
            WaitPhase::Armed { .. } if satisfied => {
                self.phase = WaitPhase::Pending { since_ms: now_ms };
                None
            }
            WaitPhase::Armed { armed_at_ms } => self.check_timeout(armed_at_ms, now_ms),
            WaitPhase::Pending { since_ms } if satisfied => {
                if now_ms.saturating_sub(since_ms) >= u64::from(self.config.debounce_ms) {
                    self.finish(WaitOutcome::Satisfied)
                } else {
                    None
                }
            }
            // Debounce by restart: the timeout window begins anew
            WaitPhase::Pending { .. } => self.arm(now_ms),
            WaitPhase::Done(outcome) => Some(outcome),
        }
    }

    fn arm(&mut self, now_ms: u64) -> Option<WaitOutcome> {
        self.phase = WaitPhase::Armed { armed_at_ms: now_ms };
        self.check_timeout(now_ms, now_ms)
    }

    fn check_timeout(&mut self, armed_at_ms: u64, now_ms: u64) -> Option<WaitOutcome> {
        if now_ms.saturating_sub(armed_at_ms) >= u64::from(self.config.timeout_ms) {
            self.finish(WaitOutcome::TimedOut)
        } else {
            None
        }
    }

    fn finish(&mut self, outcome: WaitOutcome) -> Option<WaitOutcome> {
        self.phase = WaitPhase::Done(outcome);
        Some(outcome)
    }
}

/// Convert a timeout in seconds to milliseconds
///
/// Negative and NaN values clamp to zero.
pub fn secs_to_ms(secs: f32) -> u32 {
    if secs.is_nan() || secs <= 0.0 {
        return 0;
    }
    (secs * 1000.0 + 0.5) as u32
}

/// Block until the configured input settles at its satisfied level
///
/// Each tick checks liveness, reads the input, then feeds the state machine
/// with the clock sampled after the read. Never fails: timeouts and aborts
/// are reported through [`WaitOutcome`].
pub fn wait_for_sensor<A, C, D>(
    monitor: &LivenessMonitor,
    arm: &mut A,
    clock: &C,
    delay: &mut D,
    config: &WaitConfig,
) -> WaitOutcome
where
    A: ArmStatus + DigitalInput + ?Sized,
    C: Clock + ?Sized,
    D: DelayNs,
{
    let mut wait = SensorWait::new(*config);
    let tick_ms = config.poll_tick_ms();

    log_debug!(
        "Waiting on CI{} for level {}, timeout {} ms",
        config.channel,
        config.satisfied_level,
        config.timeout_ms
    );

    loop {
        let reading = if monitor.is_alive(arm, delay) {
            match arm.read_input(config.channel) {
                Ok(level) => Reading::Level(level),
                Err(e) => Reading::ReadFailed(e),
            }
        } else {
            Reading::Dead
        };

        if let Some(outcome) = wait.poll(clock.now_ms(), reading) {
            match outcome {
                WaitOutcome::Satisfied => {
                    log_debug!("CI{} satisfied", config.channel);
                }
                WaitOutcome::TimedOut => {
                    log_warn!(
                        "CI{} timed out after {} ms",
                        config.channel,
                        config.timeout_ms
                    );
                }
                WaitOutcome::Aborted(reason) => {
                    log_warn!("CI{} wait aborted: {:?}", config.channel, reason);
                }
            }
            return outcome;
        }

        delay.delay_ms(tick_ms);
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    const TICK_MS: u64 = 10;

    /// Multiples of the poll tick in `[lo, hi]`
    fn ticks(lo: u64, hi: u64) -> impl Strategy<Value = u64> {
        (lo / TICK_MS..=hi / TICK_MS).prop_map(|n| n * TICK_MS)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            max_global_rejects: 65_536,
            ..ProptestConfig::with_cases(200)
        })]

        /// Armed level held continuously times out on the first tick at or
        /// past the timeout, never earlier
        #[test]
        fn prop_armed_level_times_out_exactly(
            timeout_ms in ticks(10, 10_000),
            start_ms in 0u64..100_000,
        ) {
            let mut wait = SensorWait::new(WaitConfig::new(0, false, timeout_ms as u32));
            let mut t = start_ms;
            loop {
                match wait.poll(t, Reading::Level(true)) {
                    None => prop_assert!(t - start_ms < timeout_ms),
                    Some(outcome) => {
                        prop_assert_eq!(outcome, WaitOutcome::TimedOut);
                        prop_assert_eq!(t - start_ms, timeout_ms);
                        break;
                    }
                }
                t += TICK_MS;
            }
        }

        /// Two armed windows each shorter than the timeout, separated by a
        /// blip shorter than the debounce, never time out
        #[test]
        fn prop_blip_restarts_timeout(
            timeout_ms in ticks(20, 5_000),
            debounce_ms in ticks(20, 500),
            first in ticks(10, 4_990),
            blip in ticks(10, 490),
            second in ticks(10, 4_990),
        ) {
            prop_assume!(first < timeout_ms && second < timeout_ms);
            prop_assume!(blip < debounce_ms);

            let config = WaitConfig::new(0, false, timeout_ms as u32)
                .with_debounce_ms(debounce_ms as u32);
            let mut wait = SensorWait::new(config);

            let mut t = 0;
            while t < first + blip + second {
                let armed = t < first || t >= first + blip;
                prop_assert_eq!(wait.poll(t, Reading::Level(armed)), None);
                t += TICK_MS;
            }
        }

        /// A satisfied level held for the debounce interval always releases,
        /// exactly when the interval elapses
        #[test]
        fn prop_held_level_releases_after_debounce(
            debounce_ms in ticks(10, 1_000),
            armed_for in ticks(10, 4_000),
        ) {
            let config = WaitConfig::new(5, false, 5_000).with_debounce_ms(debounce_ms as u32);
            let mut wait = SensorWait::new(config);

            let mut t = 0;
            while t < armed_for {
                prop_assert_eq!(wait.poll(t, Reading::Level(true)), None);
                t += TICK_MS;
            }

            let since = t;
            loop {
                match wait.poll(t, Reading::Level(false)) {
                    None => prop_assert!(t - since < debounce_ms),
                    Some(outcome) => {
                        prop_assert_eq!(outcome, WaitOutcome::Satisfied);
                        prop_assert_eq!(t - since, debounce_ms);
                        break;
                    }
                }
                t += TICK_MS;
            }
        }
    }
}
