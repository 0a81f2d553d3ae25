//! Per-wheel PI speed regulator.
//!
//! Turns a desired wheel speed and the speed measured by the encoder into a
//! motor power command.  The regulator only ever drives forward: the
//! integral term is kept in `[0, anti_windup]` and the command is never
//! negative.  Two start-up rules sit on top of the plain PI law:
//!
//! - below the null-speed threshold of *desired* speed the output is forced
//!   to zero and the integral is dropped, so a stopped robot stays quiet;
//! - while the wheel itself is still below the null speed the output is
//!   capped at `null_speed_power`, a bounded kick to break static friction.
//!
//! Neither rule applies in a cycle where the output saturates at 1.0.

use crate::config::SpeedConfig;

/// PI regulator for one wheel.
#[derive(Debug, Clone)]
pub struct SpeedRegulator {
    config: SpeedConfig,
    desired_speed: f32,
    actual_speed: f32,
    error_integral: f32,
    power: i32,
}

impl SpeedRegulator {
    pub fn new(config: SpeedConfig) -> Self {
        Self {
            config,
            desired_speed: 0.0,
            actual_speed: 0.0,
            error_integral: 0.0,
            power: 0,
        }
    }

    /// Set the target speed in m/s.
    pub fn set_desired_speed(&mut self, speed: f32) {
        self.desired_speed = speed;
    }

    /// Compute the motor power for this cycle from the measured speed (m/s).
    ///
    /// The result lies in `[0, max_power]`.
    pub fn regulate(&mut self, actual_speed: f32) -> i32 {
        let c = &self.config;
        self.actual_speed = actual_speed;

        let error = self.desired_speed - actual_speed;
        self.error_integral = (self.error_integral + c.ki * error).min(c.anti_windup).max(0.0);

        // Normalised output, 1.0 = full power.
        let mut output = c.kp * error + self.error_integral;

        // One rule per cycle: a saturated output is neither zeroed nor capped.
        if output > 1.0 {
            output = 1.0;
        } else if output < 0.0 || self.desired_speed < c.null_speed_threshold {
            output = 0.0;
            self.error_integral = 0.0;
        } else if actual_speed < c.null_speed_threshold && output > c.null_speed_power {
            output = c.null_speed_power;
            self.error_integral = 0.0;
        }

        self.power = (output * c.max_power as f32) as i32;
        self.power
    }

    /// Last commanded motor power.
    pub fn power(&self) -> i32 {
        self.power
    }

    pub fn desired_speed(&self) -> f32 {
        self.desired_speed
    }

    /// Speed passed to the last [`regulate`](Self::regulate) call.
    pub fn actual_speed(&self) -> f32 {
        self.actual_speed
    }

    pub fn integral(&self) -> f32 {
        self.error_integral
    }

    pub fn config(&self) -> SpeedConfig {
        self.config
    }

    /// Replace the gains and reset the regulator.
    pub fn set_config(&mut self, config: SpeedConfig) {
        self.config = config;
        self.reset();
    }

    /// Zero the power command and the integral.  The desired speed is kept.
    pub fn reset(&mut self) {
        self.power = 0;
        self.error_integral = 0.0;
    }
}

impl Default for SpeedRegulator {
    fn default() -> Self {
        Self::new(SpeedConfig::default())
    }
}
