//! Hobby servo driver.
//!
//! 50 Hz frame, pulse width between `min_us` (0°) and `max_us` (180°).
//! Commanded angles get the correction angle added and are clamped to
//! `90° ± min_max_angle` (itself shifted by the correction).  Some servos
//! read the pulse mirrored; `reverse_signal` flips the mapping.

use embedded_hal::pwm::SetDutyCycle;

use crate::config::{ServoConfig, SERVO_MAX_RANGE_DEGREE};
use crate::error::ActuatorError;

/// Servo frame period (50 Hz).
pub const PERIOD_US: u16 = 20_000;

pub struct ServoDriver<P> {
    pwm: P,
    config: ServoConfig,
    last_angle: i32,
    pulse_us: u16,
}

impl<P: SetDutyCycle> ServoDriver<P> {
    /// Wrap `pwm`; the output is untouched until the first command.
    pub fn new(pwm: P, config: ServoConfig) -> Self {
        Self {
            pwm,
            config,
            last_angle: 90,
            pulse_us: 0,
        }
    }

    /// Move to the configured default position.
    pub fn center(&mut self) -> Result<(), ActuatorError> {
        self.set_angle_center(i32::from(self.config.default_center_angle), false)
    }

    /// Move to `degree` (0–180).
    pub fn set_angle(&mut self, degree: i32) -> Result<(), ActuatorError> {
        let angle = (degree + i32::from(self.config.correction_angle))
            .clamp(self.config.min_angle(), self.config.max_angle());

        let span = i32::from(self.config.max_us) - i32::from(self.config.min_us);
        let pulse = if self.config.reverse_signal {
            i32::from(self.config.max_us) - angle * span / SERVO_MAX_RANGE_DEGREE
        } else {
            i32::from(self.config.min_us) + angle * span / SERVO_MAX_RANGE_DEGREE
        };
        let pulse = pulse.clamp(0, i32::from(PERIOD_US)) as u16;

        self.pwm
            .set_duty_cycle_fraction(pulse, PERIOD_US)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.last_angle = angle;
        self.pulse_us = pulse;
        Ok(())
    }

    /// Move to `degree` relative to the 90° centre (-90–90).
    pub fn set_angle_center(&mut self, degree: i32, reverse: bool) -> Result<(), ActuatorError> {
        let degree = if reverse { -degree } else { degree };
        self.set_angle(90 + degree)
    }

    /// Last commanded angle after correction and clamping.
    pub fn angle(&self) -> i32 {
        self.last_angle
    }

    /// [`angle`](Self::angle) relative to the centre.
    pub fn center_angle(&self) -> i32 {
        self.last_angle - 90
    }

    pub fn min_angle(&self) -> i32 {
        self.config.min_angle()
    }

    pub fn max_angle(&self) -> i32 {
        self.config.max_angle()
    }

    /// Pulse width of the last command in microseconds.
    pub fn pulse_us(&self) -> u16 {
        self.pulse_us
    }
}
