//! Outbound application events.
//!
//! The [`ControlLoop`](super::service::ControlLoop) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, stream over the
//! Bluetooth link, draw on a display, etc.

use crate::detection::Avoidance;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The obstacle arbiter changed state.
    AvoidanceChanged { from: Avoidance, to: Avoidance },

    /// Neither lane border is visible any more; steering falls back to 0.
    LaneLost,

    /// At least one lane border is visible again.
    LaneFound,

    /// The border threshold was calibrated from the current image.
    Calibrated { threshold: u16 },

    /// Configuration was replaced and dependent state reset.
    ConfigReplaced,

    /// The control loop has started.
    Started,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryData {
    pub cycle: u64,
    pub left_border: i32,
    pub right_border: i32,
    /// Error derived from the lane borders alone.
    pub border_error: i32,
    /// Error after obstacle arbitration.
    pub steering_error: i32,
    /// Steering servo angle (absolute degrees).
    pub steering_angle: i32,
    pub avoidance: Avoidance,
    pub desired_speed: f32,
    pub left_speed: f32,
    pub right_speed: f32,
    pub left_power: i32,
    pub right_power: i32,
    pub distance: f32,
}
