//! Recipe execution
//!
//! Runs a recipe's steps in order against an open session. Every command is
//! vetted by the liveness monitor; the first failure halts the run and no
//! further command is issued.

use embedded_hal::delay::DelayNs;
use pisco_hal::{Arm, ArmError, Clock, MotionParams};

use super::recipe::Recipe;
use super::step::Step;
use crate::config::{SensorGate, TimeoutPolicy};
use crate::sensor::{secs_to_ms, wait_for_sensor, AbortReason, WaitOutcome};
use crate::session::LivenessMonitor;
use crate::state::{ErrorKind, Event, RunState};

/// Summary of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunReport {
    /// State the run ended in
    pub state: RunState,
    /// Steps that executed successfully
    pub steps_completed: usize,
    /// Gated waits that timed out without halting the run
    pub timed_out_waits: u16,
    /// Index of the step that halted the run
    pub failed_step: Option<usize>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.state == RunState::Complete
    }
}

/// Recipe sequencer
///
/// Owns the run state machine and the motion parameters in effect. The
/// session must already be open; the sequencer never tears it down.
#[derive(Debug)]
pub struct Sequencer<'m> {
    monitor: &'m LivenessMonitor,
    state: RunState,
    params: MotionParams,
    steps_completed: usize,
    timed_out_waits: u16,
}

impl<'m> Sequencer<'m> {
    pub fn new(monitor: &'m LivenessMonitor) -> Self {
        Self {
            monitor,
            state: RunState::Boot,
            params: MotionParams::default(),
            steps_completed: 0,
            timed_out_waits: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Motion parameters the next move will use
    pub fn params(&self) -> &MotionParams {
        &self.params
    }

    /// Feed an event to the run state machine
    pub fn handle_event(&mut self, event: Event) -> RunState {
        let next = self.state.transition(event);
        if next != self.state {
            log_debug!("Run state {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        next
    }

    /// Mark the session as torn down
    pub fn teardown(&mut self) -> RunState {
        self.handle_event(Event::Teardown)
    }

    /// Execute every step of `recipe`
    pub fn run<A, C, D>(
        &mut self,
        recipe: &Recipe,
        arm: &mut A,
        clock: &C,
        delay: &mut D,
    ) -> RunReport
    where
        A: Arm + ?Sized,
        C: Clock + ?Sized,
        D: DelayNs,
    {
        if self.state.is_terminal() {
            log_error!("Sequencer already finished: {:?}", self.state);
            return self.report(None);
        }

        self.params = recipe.motion;
        self.steps_completed = 0;
        self.timed_out_waits = 0;

        self.handle_event(Event::SessionReady);
        if self.state != RunState::Ready {
            log_error!("Sequencer not ready: {:?}", self.state);
            return self.report(None);
        }

        log_info!(
            "Running recipe {} ({} steps)",
            recipe.label.as_str(),
            recipe.steps.len()
        );
        self.handle_event(Event::Start);

        for (index, step) in recipe.steps.iter().enumerate() {
            if let Err(kind) = self.execute(index, step, recipe, arm, clock, delay) {
                log_error!("Step {} ({}) halted the run: {:?}", index, step.label(), kind);
                self.handle_event(Event::ErrorDetected(kind));
                return self.report(Some(index));
            }
            self.steps_completed = index + 1;
        }

        self.handle_event(Event::SequenceFinished);
        log_info!(
            "Recipe {} complete, {} timed out waits",
            recipe.label.as_str(),
            self.timed_out_waits
        );
        self.report(None)
    }

    fn report(&self, failed_step: Option<usize>) -> RunReport {
        RunReport {
            state: self.state,
            steps_completed: self.steps_completed,
            timed_out_waits: self.timed_out_waits,
            failed_step,
        }
    }

    fn execute<A, C, D>(
        &mut self,
        index: usize,
        step: &Step,
        recipe: &Recipe,
        arm: &mut A,
        clock: &C,
        delay: &mut D,
    ) -> Result<(), ErrorKind>
    where
        A: Arm + ?Sized,
        C: Clock + ?Sized,
        D: DelayNs,
    {
        if !self.monitor.is_alive(arm, delay) {
            return Err(ErrorKind::classify(arm));
        }

        log_debug!("Step {}: {}", index, step.label());

        let result = match step {
            Step::MoveLine { pose } => arm.move_line(pose, &self.params),
            Step::MoveCircle { via, end, percent } => {
                arm.move_circle(via, end, *percent, &self.params)
            }
            Step::ControllerOutput { index, level } => arm.set_controller_output(*index, *level),
            Step::ToolOutput { index, level } => arm.set_tool_output(*index, *level),
            Step::Pause { seconds } => arm.pause(secs_to_ms(*seconds)),
            Step::Speed { .. } => {
                step.apply_speed(&mut self.params);
                return Ok(());
            }
            Step::WaitSensor { gate } => {
                let gate = match recipe.find_gate(gate) {
                    Some(gate) => gate,
                    None => {
                        log_error!("Unknown sensor gate {}", gate.as_str());
                        return Err(ErrorKind::UnknownGate);
                    }
                };
                return self.gate(gate, arm, clock, delay);
            }
        };

        self.vet(arm, delay, result, step.label())
    }

    /// Run one gated wait, inside the Gated state
    fn gate<A, C, D>(
        &mut self,
        gate: &SensorGate,
        arm: &mut A,
        clock: &C,
        delay: &mut D,
    ) -> Result<(), ErrorKind>
    where
        A: Arm + ?Sized,
        C: Clock + ?Sized,
        D: DelayNs,
    {
        self.handle_event(Event::SensorWaitStarted);

        match wait_for_sensor(self.monitor, arm, clock, delay, &gate.wait_config()) {
            WaitOutcome::Satisfied => {}
            WaitOutcome::TimedOut => {
                log_warn!("Gate {} timed out", gate.name.as_str());
                if gate.on_timeout == TimeoutPolicy::Halt {
                    return Err(ErrorKind::Timeout);
                }
                self.timed_out_waits = self.timed_out_waits.saturating_add(1);
            }
            WaitOutcome::Aborted(AbortReason::InputRead(e)) => {
                self.monitor.check_result(arm, delay, Err(e), "read_input");
                return Err(ErrorKind::CommandRejected(e.code));
            }
            WaitOutcome::Aborted(AbortReason::LivenessLost) => {
                return Err(ErrorKind::classify(arm));
            }
        }

        if !self.monitor.is_alive(arm, delay) {
            return Err(ErrorKind::classify(arm));
        }

        self.handle_event(Event::SensorWaitFinished);
        Ok(())
    }

    fn vet<A, D>(
        &self,
        arm: &mut A,
        delay: &mut D,
        result: Result<(), ArmError>,
        label: &str,
    ) -> Result<(), ErrorKind>
    where
        A: Arm + ?Sized,
        D: DelayNs,
    {
        let rejected = result.err();
        if self.monitor.check_result(arm, delay, result, label) {
            return Ok(());
        }

        Err(match rejected {
            Some(e) => ErrorKind::CommandRejected(e.code),
            None => ErrorKind::classify(arm),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pisco_drivers::sim::{ManualClock, SimArm, SimDelay};

    #[test]
    fn test_new_sequencer() {
        let monitor = LivenessMonitor::new();
        let sequencer = Sequencer::new(&monitor);
        assert_eq!(sequencer.state(), RunState::Boot);
        assert_eq!(*sequencer.params(), MotionParams::default());
    }

    #[test]
    fn test_teardown_before_start_is_ignored() {
        let monitor = LivenessMonitor::new();
        let mut sequencer = Sequencer::new(&monitor);
        assert_eq!(sequencer.teardown(), RunState::Boot);

        sequencer.handle_event(Event::SessionReady);
        assert_eq!(sequencer.teardown(), RunState::Closed);
    }

    #[test]
    fn test_finished_sequencer_does_not_rerun() {
        let monitor = LivenessMonitor::new();
        let mut sequencer = Sequencer::new(&monitor);
        sequencer.handle_event(Event::ErrorDetected(ErrorKind::UnknownGate));

        let clock = ManualClock::new();
        let mut arm = SimArm::new(&clock);
        let mut delay = SimDelay::new(&clock);
        let mut recipe = Recipe::default();
        recipe.steps.push(Step::Pause { seconds: 1.0 }).unwrap();

        let report = sequencer.run(&recipe, &mut arm, &clock, &mut delay);

        assert_eq!(report.state, RunState::Halted(ErrorKind::UnknownGate));
        assert_eq!(report.steps_completed, 0);
        assert_eq!(report.failed_step, None);
        assert_eq!(arm.command_count(), 0);
    }
}
