//! Pisco Hardware Abstraction Layer
//!
//! This crate defines the traits through which the bartender talks to an
//! external arm controller. The controller owns trajectory planning,
//! kinematics and the I/O subsystem; the application only reads status,
//! issues commands and listens for pushed notifications.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (pisco-station, etc.)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pisco-core (liveness, gated waits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pisco-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ pisco-drivers │       │ vendor client │
//! │   (SimArm)    │       │  (external)   │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`arm::ArmStatus`], [`arm::ArmSetup`] - Session status and preparation
//! - [`gpio::DigitalInput`], [`gpio::DigitalOutput`] - Controller and tool I/O
//! - [`motion::Motion`] - Cartesian motion primitives
//! - [`notify::NotificationSource`] - Pushed fault/state/count notifications
//! - [`time::Clock`] - Monotonic millisecond clock

#![no_std]
#![deny(unsafe_code)]

pub mod arm;
pub mod gpio;
pub mod motion;
pub mod notify;
pub mod time;

// Re-export key traits at crate root for convenience
pub use arm::{Arm, ArmError, ArmSetup, ArmStatus, ControllerState};
pub use gpio::{DigitalInput, DigitalOutput};
pub use motion::{Motion, MotionParams, Pose};
pub use notify::{Disposition, Notification, NotificationSink, NotificationSource, Topic};
pub use time::Clock;
