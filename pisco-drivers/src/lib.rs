//! Arm controller implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in pisco-hal:
//!
//! - Simulated arm controller with scripted inputs and controller events
//! - Manually advanced clock and matching delay for virtual-time tests

#![no_std]
#![deny(unsafe_code)]

pub mod sim;
