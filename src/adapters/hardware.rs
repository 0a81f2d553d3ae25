//! Hardware adapter: bridges the PWM drivers to the actuator port.
//!
//! Owns both H-bridge motors and the servos, exposing them through
//! [`ActuatorPort`].  A PWM write that fails is logged and counted; the
//! control loop keeps running and retries on the next cycle.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{ActuatorPort, ServoChannel, Wheel};
use crate::drivers::motor::MotorDriver;
use crate::drivers::servo::ServoDriver;
use crate::error::ActuatorError;

/// Concrete adapter that combines all actuators behind the port trait.
///
/// `M` is the motor PWM channel type, `S` the servo channel type.
pub struct PwmActuators<M, S> {
    left: MotorDriver<M, M>,
    right: MotorDriver<M, M>,
    steering: ServoDriver<S>,
    scanner: Option<ServoDriver<S>>,
    write_failures: u32,
}

impl<M: SetDutyCycle, S: SetDutyCycle> PwmActuators<M, S> {
    pub fn new(left: MotorDriver<M, M>, right: MotorDriver<M, M>, steering: ServoDriver<S>) -> Self {
        Self {
            left,
            right,
            steering,
            scanner: None,
            write_failures: 0,
        }
    }

    /// Add the servo carrying the obstacle sensor.
    pub fn with_scanner(mut self, scanner: ServoDriver<S>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    pub fn motor(&self, wheel: Wheel) -> &MotorDriver<M, M> {
        match wheel {
            Wheel::Left => &self.left,
            Wheel::Right => &self.right,
        }
    }

    pub fn steering(&self) -> &ServoDriver<S> {
        &self.steering
    }

    pub fn scanner(&self) -> Option<&ServoDriver<S>> {
        self.scanner.as_ref()
    }

    /// PWM writes that failed since start-up.
    pub fn write_failures(&self) -> u32 {
        self.write_failures
    }

    fn check(&mut self, what: &str, result: Result<(), ActuatorError>) {
        if let Err(e) = result {
            self.write_failures = self.write_failures.saturating_add(1);
            warn!("{what}: {e} ({} failures)", self.write_failures);
        }
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<M: SetDutyCycle, S: SetDutyCycle> ActuatorPort for PwmActuators<M, S> {
    fn set_motor_power(&mut self, wheel: Wheel, power: i32) {
        let result = match wheel {
            Wheel::Left => self.left.set_power(power),
            Wheel::Right => self.right.set_power(power),
        };
        self.check("motor", result);
    }

    fn set_servo_angle(&mut self, servo: ServoChannel, degree: i32) {
        let result = match servo {
            ServoChannel::Steering => self.steering.set_angle(degree),
            ServoChannel::Scanner => match self.scanner.as_mut() {
                Some(scanner) => scanner.set_angle(degree),
                None => Ok(()),
            },
        };
        self.check("servo", result);
    }

    fn all_off(&mut self) {
        let left = self.left.stop();
        self.check("motor", left);
        let right = self.right.stop();
        self.check("motor", right);
    }
}
