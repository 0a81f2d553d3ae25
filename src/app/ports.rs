//! Port traits: the hexagonal boundary between the control core and the
//! robot's peripherals.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Camera, ADC and encoder drivers fill a [`Snapshot`] and hand it over
//! through [`SensorPort`]; motor and servo drivers sit behind
//! [`ActuatorPort`]; events leave through [`EventSink`].  The
//! [`ControlLoop`](super::service::ControlLoop) consumes them via
//! generics, so the core never touches hardware directly.

use crate::config::CAMERA_IMAGE_SIZE;
use crate::image::LineImage;
use crate::sensors::WheelFeedback;

// ───────────────────────────────────────────────────────────────
// Cycle snapshot
// ───────────────────────────────────────────────────────────────

/// Everything the core needs for one control cycle, captured before any
/// detection runs.  `R` is the proximity reading of the obstacle sense in
/// use.
#[derive(Debug, Clone)]
pub struct Snapshot<R, const N: usize = CAMERA_IMAGE_SIZE> {
    /// Line camera exposure.
    pub image: LineImage<N>,
    /// Obstacle sensor data.
    pub proximity: R,
    pub left_wheel: WheelFeedback,
    pub right_wheel: WheelFeedback,
}

impl<R, const N: usize> Snapshot<R, N> {
    /// Snapshot of a robot standing still.
    pub fn new(image: LineImage<N>, proximity: R) -> Self {
        Self {
            image,
            proximity,
            left_wheel: WheelFeedback::default(),
            right_wheel: WheelFeedback::default(),
        }
    }

    /// Mean distance travelled by both wheels (m).
    pub fn distance(&self) -> f32 {
        (self.left_wheel.distance + self.right_wheel.distance) / 2.0
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per cycle.
pub trait SensorPort<R, const N: usize = CAMERA_IMAGE_SIZE> {
    /// Capture a complete, consistent snapshot for this cycle.
    fn capture(&mut self) -> Snapshot<R, N>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wheel {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoChannel {
    /// Front axle steering.
    Steering,
    /// Obstacle sensor sweep.
    Scanner,
}

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Signed motor power, magnitude at most the configured maximum.
    fn set_motor_power(&mut self, wheel: Wheel, power: i32);

    /// Absolute servo angle in degrees (90 = centre).
    fn set_servo_angle(&mut self, servo: ServoChannel, degree: i32);

    /// Stop both motors for a safe shutdown.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// Bluetooth telemetry, a display, ...).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
