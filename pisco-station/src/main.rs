//! Pisco - Bartender Station
//!
//! Runs a drink recipe against the arm controller. Every sensor-gated wait
//! is watched by the session's liveness monitor, so a fault, a stop, or a
//! lost connection halts the run instead of commanding a dead arm.
//!
//! The controller is simulated: its inputs and events follow the script in
//! `[simulation]`, in virtual time unless `realtime` is set.

use std::process::ExitCode;

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use pisco_core::sequence::{RunReport, Sequencer};
use pisco_core::session::{LivenessMonitor, Session};
use pisco_drivers::sim::{ManualClock, SimDelay, SimPacing};

mod clock;
mod config;

use crate::clock::SystemClock;
use crate::config::StationConfig;

/// Embedded default configuration
/// Edit station.toml and rebuild, or point PISCO_CONFIG at another file
const EMBEDDED_CONFIG: &str = include_str!("../station.toml");

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Pisco station {} starting...", env!("CARGO_PKG_VERSION"));

    let config = match config::load(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Connecting to arm at {} (simulated)", config.arm.address);
    let monitor = LivenessMonitor::new();

    let report = if config.simulation.realtime {
        let clock = SystemClock::new();
        serve(&config, &monitor, clock, &mut embassy_time::Delay)
    } else {
        let clock = ManualClock::new();
        serve(&config, &monitor, &clock, &mut SimDelay::new(&clock))
    };

    match report {
        Some(report) if report.is_complete() => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

/// Open a session, run the recipe, and tear the session down
fn serve<P, D>(
    config: &StationConfig,
    monitor: &LivenessMonitor,
    pacing: P,
    delay: &mut D,
) -> Option<RunReport>
where
    P: SimPacing + Copy,
    D: DelayNs,
{
    let mut arm = match config.simulation.build(pacing) {
        Ok(arm) => arm,
        Err(e) => {
            error!("Simulation script rejected: {:?}", e);
            return None;
        }
    };

    let session = match Session::open(monitor, &mut arm, delay) {
        Ok(session) => session,
        Err(e) => {
            error!("Session setup failed: {}", e);
            return None;
        }
    };

    let recipe = &config.recipe;
    info!(
        "Running {} ({} steps, {} gated waits)",
        recipe.label,
        recipe.steps.len(),
        recipe.wait_count()
    );

    let mut sequencer = Sequencer::new(monitor);
    let report = sequencer.run(recipe, &mut arm, &pacing, delay);

    session.close(&mut arm);
    sequencer.teardown();

    log_report(&report, arm.command_count());
    Some(report)
}

fn log_report(report: &RunReport, commands: usize) {
    if report.is_complete() {
        info!(
            "Run complete: {} steps, {} commands",
            report.steps_completed, commands
        );
    } else {
        error!(
            "Run ended in {:?} at step {:?} after {} steps",
            report.state, report.failed_step, report.steps_completed
        );
    }

    if report.timed_out_waits > 0 {
        warn!("{} gated waits timed out", report.timed_out_waits);
    }
}
