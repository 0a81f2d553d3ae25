//! Sensor-side collaborators: encoder odometry and proximity readings.
//!
//! Nothing here touches a peripheral.  Drivers push raw data in (pulse
//! edges, ADC reads) and the control loop pulls derived values out.

pub mod encoder;
pub mod proximity;

/// Feedback from one wheel for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelFeedback {
    /// Measured speed in m/s.
    pub speed: f32,
    /// Distance travelled since start-up in metres.
    pub distance: f32,
}

impl WheelFeedback {
    /// Read both values off an odometer.
    pub fn from_odometer(odometer: &encoder::Odometer) -> Self {
        Self {
            speed: odometer.speed(),
            distance: odometer.distance(),
        }
    }
}
