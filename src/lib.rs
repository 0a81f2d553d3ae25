//! Linebot control library.
//!
//! The decision core of a small line-following robot: lane borders from a
//! line camera, per-wheel speed regulation and an obstacle-avoidance
//! override on the steering error.  Peripherals are reached through the
//! port traits in [`app::ports`], so everything here runs on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod detection;
pub mod drivers;
pub mod error;
pub mod image;
pub mod sensors;

pub use error::{Error, Result};

#[cfg(test)]
use critical_section as _;
