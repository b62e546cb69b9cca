//! Gated waits against the simulated controller in virtual time

use std::time::Duration;

use heapless::String;
use pisco_core::config::SensorGate;
use pisco_core::sensor::{
    wait_for_sensor, AbortReason, WaitConfig, WaitOutcome, MAX_POLL_INTERVAL_MS,
};
use pisco_core::session::LivenessMonitor;
use pisco_drivers::sim::{ManualClock, SimArm, SimDelay, SimEvent};
use pisco_hal::{
    ArmError, Clock, ControllerState, Notification, NotificationSink, NotificationSource, Topic,
};

const LID: u8 = 0;
const ICE: u8 = 5;

/// Lid gate: released by a low input, 5 s timeout
fn lid_gate() -> WaitConfig {
    WaitConfig::new(LID, false, 5000)
}

#[test]
fn test_satisfied_immediately() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    let mut delay = SimDelay::new(&clock);

    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &lid_gate());

    assert_eq!(outcome, WaitOutcome::Satisfied);
    assert_eq!(clock.now_ms(), 0);
    assert_eq!(arm.input_reads(), 1);
}

#[test]
fn test_armed_level_times_out() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.set_input(LID, true).unwrap();
    let mut delay = SimDelay::new(&clock);

    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &lid_gate());

    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert_eq!(clock.now_ms(), 5000);
    assert!(monitor.is_marked_alive());
}

#[test]
fn test_blip_restarts_timeout() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.set_input(LID, true).unwrap();
    arm.script_input(LID, 4900, false).unwrap();
    arm.script_input(LID, 4950, true).unwrap();
    let mut delay = SimDelay::new(&clock);

    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &lid_gate());

    // The 50 ms blip is shorter than the debounce; the window restarts at 4.95 s
    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert_eq!(clock.now_ms(), 9950);
}

#[test]
fn test_release_after_debounce() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.set_input(ICE, true).unwrap();
    arm.script_input(ICE, 2000, false).unwrap();
    let mut delay = SimDelay::new(&clock);

    let config = WaitConfig::new(ICE, false, 5000);
    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &config);

    assert_eq!(outcome, WaitOutcome::Satisfied);
    assert_eq!(clock.now_ms(), 2100);
}

#[test]
fn test_zero_timeout() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.set_input(LID, true).unwrap();
    let mut delay = SimDelay::new(&clock);

    let config = WaitConfig::new(LID, false, 0);
    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &config);

    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert_eq!(clock.now_ms(), 0);
}

#[test]
fn test_fault_mid_wait_aborts_within_one_poll() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.set_input(LID, true).unwrap();
    arm.schedule(1234, SimEvent::Fault(19)).unwrap();
    let mut delay = SimDelay::new(&clock);

    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &lid_gate());

    assert_eq!(outcome, WaitOutcome::Aborted(AbortReason::LivenessLost));
    assert!(clock.now_ms() >= 1234);
    assert!(clock.now_ms() - 1234 <= 10);
}

#[test]
fn test_slow_gate_still_aborts_within_max_tick() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.set_input(LID, true).unwrap();
    arm.schedule(1234, SimEvent::Fault(19)).unwrap();
    let mut delay = SimDelay::new(&clock);

    let gate = SensorGate {
        name: String::try_from("mixer_lid").unwrap(),
        channel: LID,
        poll_ms: 1000,
        ..SensorGate::default()
    };
    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &gate.wait_config());

    assert_eq!(outcome, WaitOutcome::Aborted(AbortReason::LivenessLost));
    assert!(clock.now_ms() - 1234 <= u64::from(MAX_POLL_INTERVAL_MS));

    // The driver clamps the tick even when the config asks for more
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.set_input(LID, true).unwrap();
    arm.schedule(1234, SimEvent::Fault(19)).unwrap();
    let mut delay = SimDelay::new(&clock);

    let config = lid_gate().with_poll_interval_ms(1000);
    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &config);

    assert_eq!(outcome, WaitOutcome::Aborted(AbortReason::LivenessLost));
    assert!(clock.now_ms() - 1234 <= u64::from(MAX_POLL_INTERVAL_MS));
}

#[test]
fn test_zero_poll_interval_still_advances() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.set_input(LID, true).unwrap();
    let mut delay = SimDelay::new(&clock);

    let config = WaitConfig::new(LID, false, 50).with_poll_interval_ms(0);
    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &config);

    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert_eq!(clock.now_ms(), 50);
}

#[test]
fn test_pushed_stop_latches_monitor() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.subscribe(Topic::State, &monitor).unwrap();
    arm.set_input(LID, true).unwrap();
    arm.schedule(700, SimEvent::State(ControllerState::Stopped))
        .unwrap();
    let mut delay = SimDelay::new(&clock);

    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &lid_gate());

    assert_eq!(outcome, WaitOutcome::Aborted(AbortReason::LivenessLost));
    assert_eq!(clock.now_ms(), 700);
    assert!(!monitor.is_marked_alive());
    assert!(!arm.is_subscribed(Topic::State));
}

#[test]
fn test_settling_is_waited_out() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.set_input(LID, true).unwrap();
    arm.schedule(500, SimEvent::State(ControllerState::Settling))
        .unwrap();
    arm.schedule(750, SimEvent::State(ControllerState::Idle))
        .unwrap();
    let mut delay = SimDelay::new(&clock);

    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &lid_gate());

    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert_eq!(clock.now_ms(), 5000);
}

#[test]
fn test_stuck_settling_aborts() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.set_input(LID, true).unwrap();
    arm.schedule(500, SimEvent::State(ControllerState::Settling))
        .unwrap();
    let mut delay = SimDelay::new(&clock);

    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &lid_gate());

    // Five re-polls, 100 ms apart
    assert_eq!(outcome, WaitOutcome::Aborted(AbortReason::LivenessLost));
    assert_eq!(clock.now_ms(), 1000);
}

#[test]
fn test_disconnect_aborts() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.set_input(LID, true).unwrap();
    arm.schedule(300, SimEvent::Disconnect).unwrap();
    let mut delay = SimDelay::new(&clock);

    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &lid_gate());

    assert_eq!(outcome, WaitOutcome::Aborted(AbortReason::LivenessLost));
    assert_eq!(clock.now_ms(), 300);
}

#[test]
fn test_read_failure_aborts() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.fail_input_reads(Some(-3));
    let mut delay = SimDelay::new(&clock);

    let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &lid_gate());

    assert_eq!(
        outcome,
        WaitOutcome::Aborted(AbortReason::InputRead(ArmError::new(-3)))
    );
}

#[test]
fn test_timer_does_not_leak_between_waits() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.set_input(LID, true).unwrap();
    let mut delay = SimDelay::new(&clock);

    let first = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &lid_gate());
    assert_eq!(first, WaitOutcome::TimedOut);
    assert_eq!(clock.now_ms(), 5000);

    let second = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &lid_gate());
    assert_eq!(second, WaitOutcome::TimedOut);
    assert_eq!(clock.now_ms(), 10_000);
}

#[test]
fn test_fault_from_another_thread() {
    let clock = ManualClock::new();
    let monitor = LivenessMonitor::new();
    let mut arm = SimArm::new(&clock);
    arm.set_input(LID, true).unwrap();
    let mut delay = SimDelay::new(&clock);

    // Never times out in practice; only the pushed fault can end the wait
    let config = WaitConfig::new(LID, false, u32::MAX);

    std::thread::scope(|s| {
        s.spawn(|| {
            std::thread::sleep(Duration::from_millis(5));
            monitor.notify(Notification::Fault { code: 19 });
        });

        let outcome = wait_for_sensor(&monitor, &mut arm, &clock, &mut delay, &config);
        assert_eq!(outcome, WaitOutcome::Aborted(AbortReason::LivenessLost));
    });

    assert!(!monitor.is_marked_alive());
}
