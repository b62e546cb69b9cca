//! Simulated arm controller
//!
//! Behaves like the vendor controller as seen through the hal traits:
//! - Commands are refused with the controller's codes when it is
//!   disconnected, faulted or not in a commandable state
//! - Moves and pauses take time on the pacing clock
//! - Scheduled fault/state/count events are applied as time passes and
//!   pushed to the subscribed sinks, which may ask to be detached
//!
//! # Usage
//!
//! ```ignore
//! let clock = ManualClock::new();
//! let mut arm = SimArm::new(&clock);
//! arm.set_input(0, true)?;
//! arm.script_input(0, 4_900, false)?;
//! arm.schedule(2_000, SimEvent::Fault(19))?;
//! ```

use heapless::{HistoryBuffer, Vec};
use pisco_hal::{
    ArmError, ArmSetup, ArmStatus, ControllerState, DigitalInput, DigitalOutput, Disposition,
    Motion, MotionParams, Notification, NotificationSink, NotificationSource, Pose, Topic,
};

use super::clock::SimPacing;
use super::script::{InputScript, SimEvent, MAX_EVENTS, MAX_INPUTS};

/// Commands kept in the log
pub const MAX_COMMAND_LOG: usize = 256;

/// Host API code: not connected
pub const CODE_NOT_CONNECTED: i32 = -1;
/// Host API code: command not supported
pub const CODE_NOT_SUPPORTED: i32 = -4;
/// Host API code: parameter out of range
pub const CODE_OUT_OF_RANGE: i32 = -8;
/// Controller code: uncleared fault
pub const CODE_HAS_FAULT: i32 = 1;
/// Controller code: not ready to move
pub const CODE_NOT_READY: i32 = 9;

/// Tool digital outputs
const TOOL_OUTPUTS: usize = 2;
/// Default duration of a simulated move
const DEFAULT_MOTION_MS: u32 = 500;

/// Command received by the simulated controller
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    ClearWarnings,
    ClearErrors,
    EnableMotion(bool),
    SetMode(u8),
    SetState(u8),
    MoveLine(Pose),
    MoveCircle { via: Pose, end: Pose, percent: f32 },
    ControllerOutput { index: u8, level: bool },
    ToolOutput { index: u8, level: bool },
    Pause(u32),
}

impl Command {
    /// Check if this command moves the arm or drives an output
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            Command::MoveLine(_)
                | Command::MoveCircle { .. }
                | Command::ControllerOutput { .. }
                | Command::ToolOutput { .. }
                | Command::Pause(_)
        )
    }
}

/// Simulation setup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimError {
    /// No such controller input
    InvalidChannel(u8),
    /// Script or event queue at capacity
    ScriptFull,
}

/// Simulated arm controller
pub struct SimArm<'a, P> {
    pacing: P,
    connected: bool,
    motion_enabled: bool,
    error_code: u16,
    state: ControllerState,
    /// Counter value, when the controller publishes one
    counter: Option<u32>,
    inputs: [InputScript; MAX_INPUTS],
    /// `(at_ms, event)` in ascending time order
    events: Vec<(u64, SimEvent), MAX_EVENTS>,
    sinks: [Option<&'a dyn NotificationSink>; 3],
    reject_next: Option<i32>,
    input_fault: Option<i32>,
    motion_ms: u32,
    controller_outputs: [bool; MAX_INPUTS],
    tool_outputs: [bool; TOOL_OUTPUTS],
    log: HistoryBuffer<Command, MAX_COMMAND_LOG>,
    command_count: usize,
    input_reads: usize,
}

impl<'a, P: SimPacing> SimArm<'a, P> {
    /// Create a connected, idle controller with every input low
    pub fn new(pacing: P) -> Self {
        Self {
            pacing,
            connected: true,
            motion_enabled: true,
            error_code: 0,
            state: ControllerState::Idle,
            counter: None,
            inputs: core::array::from_fn(|_| InputScript::new(false)),
            events: Vec::new(),
            sinks: [None; 3],
            reject_next: None,
            input_fault: None,
            motion_ms: DEFAULT_MOTION_MS,
            controller_outputs: [false; MAX_INPUTS],
            tool_outputs: [false; TOOL_OUTPUTS],
            log: HistoryBuffer::new(),
            command_count: 0,
            input_reads: 0,
        }
    }

    /// Publish a counter, enabling the count topic
    pub fn with_counter(mut self, initial: u32) -> Self {
        self.counter = Some(initial);
        self
    }

    /// Set how long each simulated move takes
    pub fn with_motion_ms(mut self, motion_ms: u32) -> Self {
        self.motion_ms = motion_ms;
        self
    }

    /// Start in the given controller state
    pub fn with_state(mut self, state: ControllerState) -> Self {
        self.state = state;
        self
    }

    /// Reset an input to a constant level
    pub fn set_input(&mut self, channel: u8, level: bool) -> Result<(), SimError> {
        *self.input_mut(channel)? = InputScript::new(level);
        Ok(())
    }

    /// Change an input's level at `at_ms`
    pub fn script_input(&mut self, channel: u8, at_ms: u64, level: bool) -> Result<(), SimError> {
        if self.input_mut(channel)?.push(at_ms, level) {
            Ok(())
        } else {
            Err(SimError::ScriptFull)
        }
    }

    /// Schedule a controller event at `at_ms`
    pub fn schedule(&mut self, at_ms: u64, event: SimEvent) -> Result<(), SimError> {
        let pos = self
            .events
            .iter()
            .position(|&(t, _)| t > at_ms)
            .unwrap_or(self.events.len());
        self.events
            .insert(pos, (at_ms, event))
            .map_err(|_| SimError::ScriptFull)
    }

    /// Apply a controller event now
    pub fn inject(&mut self, event: SimEvent) {
        self.sync();
        self.apply(event);
    }

    /// Refuse the next command with `code`
    pub fn reject_next(&mut self, code: i32) {
        self.reject_next = Some(code);
    }

    /// Fail every input read with `code` (`None` restores reads)
    pub fn fail_input_reads(&mut self, code: Option<i32>) {
        self.input_fault = code;
    }

    /// Commands received, oldest first
    pub fn commands(&self) -> impl Iterator<Item = &Command> + '_ {
        self.log.oldest_ordered()
    }

    /// Total commands received, including any evicted from the log
    pub fn command_count(&self) -> usize {
        self.command_count
    }

    pub fn controller_output(&self, index: u8) -> Option<bool> {
        self.controller_outputs.get(usize::from(index)).copied()
    }

    pub fn tool_output(&self, index: u8) -> Option<bool> {
        self.tool_outputs.get(usize::from(index)).copied()
    }

    /// Input reads attempted, failed ones included
    pub fn input_reads(&self) -> usize {
        self.input_reads
    }

    fn input_mut(&mut self, channel: u8) -> Result<&mut InputScript, SimError> {
        self.inputs
            .get_mut(usize::from(channel))
            .ok_or(SimError::InvalidChannel(channel))
    }

    /// Apply every event whose time has come
    fn sync(&mut self) {
        let now = self.pacing.now_ms();
        while self.events.first().is_some_and(|&(t, _)| t <= now) {
            let (_, event) = self.events.remove(0);
            self.apply(event);
        }
    }

    fn apply(&mut self, event: SimEvent) {
        match event {
            SimEvent::Fault(code) => {
                self.error_code = code;
                self.publish(Notification::Fault { code });
            }
            SimEvent::State(state) => self.change_state(state),
            SimEvent::Disconnect => self.connected = false,
            SimEvent::Count(count) => {
                if self.counter.is_some() {
                    self.counter = Some(count);
                    self.publish(Notification::Count(count));
                }
            }
        }
    }

    fn change_state(&mut self, state: ControllerState) {
        if self.state != state {
            self.state = state;
            self.publish(Notification::State(state));
        }
    }

    fn publish(&mut self, notification: Notification) {
        let index = notification.topic().index();
        if let Some(sink) = self.sinks[index] {
            if sink.notify(notification) == Disposition::Detach {
                self.sinks[index] = None;
            }
        }
    }

    /// Log a command and decide whether the controller accepts it
    fn admit(&mut self, command: Command) -> Result<(), ArmError> {
        self.sync();
        self.log.write(command);
        self.command_count += 1;

        if let Some(code) = self.reject_next.take() {
            return Err(ArmError::new(code));
        }
        if !self.connected {
            return Err(ArmError::new(CODE_NOT_CONNECTED));
        }
        if command.is_motion() {
            if self.error_code != 0 {
                return Err(ArmError::new(CODE_HAS_FAULT));
            }
            if !self.motion_enabled || !self.state.accepts_commands() {
                return Err(ArmError::new(CODE_NOT_READY));
            }
        }
        Ok(())
    }

    /// Spend `ms` in `busy`, then settle back to idle unless an event
    /// moved the controller elsewhere meanwhile
    fn run_for(&mut self, busy: ControllerState, ms: u32) {
        self.change_state(busy);
        self.pacing.elapse(ms);
        self.sync();
        if self.state == busy {
            self.change_state(ControllerState::Idle);
        }
    }
}

impl<P: SimPacing> ArmStatus for SimArm<'_, P> {
    fn is_connected(&mut self) -> bool {
        self.sync();
        self.connected
    }

    fn error_code(&mut self) -> u16 {
        self.sync();
        self.error_code
    }

    fn controller_state(&mut self) -> ControllerState {
        self.sync();
        self.state
    }
}

impl<P: SimPacing> ArmSetup for SimArm<'_, P> {
    fn clear_warnings(&mut self) -> Result<(), ArmError> {
        self.admit(Command::ClearWarnings)
    }

    fn clear_errors(&mut self) -> Result<(), ArmError> {
        self.admit(Command::ClearErrors)?;
        if self.error_code != 0 {
            self.apply(SimEvent::Fault(0));
        }
        Ok(())
    }

    fn enable_motion(&mut self, enable: bool) -> Result<(), ArmError> {
        self.admit(Command::EnableMotion(enable))?;
        self.motion_enabled = enable;
        Ok(())
    }

    fn set_mode(&mut self, mode: u8) -> Result<(), ArmError> {
        self.admit(Command::SetMode(mode))
    }

    fn set_state(&mut self, state: u8) -> Result<(), ArmError> {
        self.admit(Command::SetState(state))?;
        let next = match state {
            0 => ControllerState::Idle,
            3 => ControllerState::Paused,
            4 => ControllerState::Stopped,
            _ => return Err(ArmError::new(CODE_OUT_OF_RANGE)),
        };
        self.change_state(next);
        Ok(())
    }
}

impl<P: SimPacing> DigitalInput for SimArm<'_, P> {
    fn read_input(&mut self, index: u8) -> Result<bool, ArmError> {
        self.sync();
        self.input_reads += 1;
        if !self.connected {
            return Err(ArmError::new(CODE_NOT_CONNECTED));
        }
        if let Some(code) = self.input_fault {
            return Err(ArmError::new(code));
        }

        let now = self.pacing.now_ms();
        self.inputs
            .get(usize::from(index))
            .map(|script| script.level_at(now))
            .ok_or(ArmError::new(CODE_OUT_OF_RANGE))
    }
}

impl<P: SimPacing> DigitalOutput for SimArm<'_, P> {
    fn set_controller_output(&mut self, index: u8, high: bool) -> Result<(), ArmError> {
        self.admit(Command::ControllerOutput { index, level: high })?;
        let slot = self
            .controller_outputs
            .get_mut(usize::from(index))
            .ok_or(ArmError::new(CODE_OUT_OF_RANGE))?;
        *slot = high;
        Ok(())
    }

    fn set_tool_output(&mut self, index: u8, high: bool) -> Result<(), ArmError> {
        self.admit(Command::ToolOutput { index, level: high })?;
        let slot = self
            .tool_outputs
            .get_mut(usize::from(index))
            .ok_or(ArmError::new(CODE_OUT_OF_RANGE))?;
        *slot = high;
        Ok(())
    }
}

impl<P: SimPacing> Motion for SimArm<'_, P> {
    fn move_line(&mut self, pose: &Pose, _params: &MotionParams) -> Result<(), ArmError> {
        self.admit(Command::MoveLine(*pose))?;
        let ms = self.motion_ms;
        self.run_for(ControllerState::Moving, ms);
        Ok(())
    }

    fn move_circle(
        &mut self,
        via: &Pose,
        end: &Pose,
        percent: f32,
        _params: &MotionParams,
    ) -> Result<(), ArmError> {
        self.admit(Command::MoveCircle {
            via: *via,
            end: *end,
            percent,
        })?;
        let ms = self.motion_ms;
        self.run_for(ControllerState::Moving, ms);
        Ok(())
    }

    fn pause(&mut self, duration_ms: u32) -> Result<(), ArmError> {
        self.admit(Command::Pause(duration_ms))?;
        self.run_for(ControllerState::Paused, duration_ms);
        Ok(())
    }
}

impl<'a, P: SimPacing> NotificationSource<'a> for SimArm<'a, P> {
    fn supports(&self, topic: Topic) -> bool {
        match topic {
            Topic::Fault | Topic::State => true,
            Topic::Count => self.counter.is_some(),
        }
    }

    fn subscribe(&mut self, topic: Topic, sink: &'a dyn NotificationSink) -> Result<(), ArmError> {
        if !self.supports(topic) {
            return Err(ArmError::new(CODE_NOT_SUPPORTED));
        }
        self.sinks[topic.index()] = Some(sink);
        Ok(())
    }

    fn unsubscribe(&mut self, topic: Topic) -> Result<(), ArmError> {
        self.sinks[topic.index()] = None;
        Ok(())
    }

    fn is_subscribed(&self, topic: Topic) -> bool {
        self.sinks[topic.index()].is_some()
    }
}
