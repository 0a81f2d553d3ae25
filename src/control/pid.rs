//! PID controller for the steering servo
//!
//! Classic proportional-integral-derivative controller turning the
//! arbitrated lane error (pixels) into a steering deflection in degrees
//! around the servo centre.

use crate::config::SteeringConfig;

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    integral: f32,
    prev_error: f32,
    output_min: f32,
    output_max: f32,
}

impl PidController {
    pub fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral: 0.0,
            prev_error: 0.0,
            output_min: -90.0,
            output_max: 90.0,
        }
    }

    /// Build a steering controller from configuration.
    pub fn from_config(config: &SteeringConfig) -> Self {
        let mut pid = Self::new(config.kp, config.ki, config.kd);
        pid.set_limits(config.output_min, config.output_max);
        pid
    }

    /// Set output limits
    pub fn set_limits(&mut self, min: f32, max: f32) {
        self.output_min = min;
        self.output_max = max;
    }

    /// Compute the output for the current `error`.
    ///
    /// `dt` is the time since the previous call in seconds.
    pub fn compute(&mut self, error: f32, dt: f32) -> f32 {
        let slope = if dt > 0.0 { (error - self.prev_error) / dt } else { 0.0 };
        self.prev_error = error;

        let step = error * dt;
        let unclamped = self.kp * error + self.ki * (self.integral + step) + self.kd * slope;
        let deflection = unclamped.clamp(self.output_min, self.output_max);

        // The integral only grows while the servo is not at its stop.
        if deflection < self.output_max && deflection > self.output_min {
            self.integral += step;
        }
        deflection
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }
}
