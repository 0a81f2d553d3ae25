//! Application core. Pure domain logic, no I/O.
//!
//! This module wires the detectors and regulators into one control cycle.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod mailbox;
pub mod ports;
pub mod service;
