//! Board-agnostic core logic for the robotic bartender
//!
//! This crate contains all application logic that does not depend on a
//! specific arm controller:
//!
//! - Liveness monitoring and session lifecycle
//! - Sensor-gated waits (debounce-by-restart timeout state machine)
//! - Run state machine for recipe execution
//! - Recipe sequencer
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod logging;

pub mod config;
pub mod sensor;
pub mod sequence;
pub mod session;
pub mod state;
