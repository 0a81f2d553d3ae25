//! Inbound commands to the control loop.
//!
//! These represent actions requested by the outside world (buttons,
//! Bluetooth console, start gate) that the
//! [`ControlLoop`](super::service::ControlLoop) interprets and acts upon.

use crate::config::RobotConfig;

/// Commands that external adapters can send into the control core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Set the desired cruising speed of both wheels (m/s).
    SetSpeed(f32),

    /// Drop the desired speed to zero and cut motor power immediately.
    Stop,

    /// Recalibrate the border threshold from the next camera image.
    Calibrate,

    /// Replace the configuration; dependent state is reset.
    UpdateConfig(RobotConfig),

    /// Enable or disable the obstacle override (detection keeps running).
    SetObstacleAvoidance(bool),

    /// Reset every detector and regulator to its initial state.
    Reset,
}
