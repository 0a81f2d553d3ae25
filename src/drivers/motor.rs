//! DC drive motor on an H-bridge.
//!
//! Two PWM inputs per motor: driving `in0` turns the wheel forward,
//! driving `in1` turns it backward, both low coasts.  Power is a signed
//! value in `[-MAX_POWER, MAX_POWER]`; the duty cycle is `|power| /
//! MAX_POWER` of the active channel.
//!
//! The speed regulator only produces non-negative commands; direction
//! (and the per-motor mounting inversion) is this driver's business.

use embedded_hal::pwm::SetDutyCycle;

use crate::error::ActuatorError;

/// Full-scale motor command.
pub const MAX_POWER: i32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Stopped,
    Running { power: i32, dir: Direction },
}

pub struct MotorDriver<A, B> {
    in0: A,
    in1: B,
    inverse: bool,
    max_power_percent: i32,
    state: MotorState,
}

impl<A: SetDutyCycle, B: SetDutyCycle> MotorDriver<A, B> {
    /// `inverse` swaps the meaning of forward for a mirrored mounting.
    pub fn new(in0: A, in1: B, inverse: bool) -> Self {
        Self {
            in0,
            in1,
            inverse,
            max_power_percent: 100,
            state: MotorState::Stopped,
        }
    }

    /// Drive with signed `power`; values beyond ±[`MAX_POWER`] are clamped.
    pub fn set_power(&mut self, power: i32) -> Result<(), ActuatorError> {
        let mut power = power.clamp(-MAX_POWER, MAX_POWER);
        if self.inverse {
            power = -power;
        }
        if self.max_power_percent != 100 {
            power = power * self.max_power_percent / 100;
        }

        if power > 0 {
            self.set_duty_hw(power as u16, 0)?;
            self.state = MotorState::Running {
                power,
                dir: Direction::Forward,
            };
        } else if power < 0 {
            self.set_duty_hw(0, (-power) as u16)?;
            self.state = MotorState::Running {
                power: -power,
                dir: Direction::Reverse,
            };
        } else {
            self.set_duty_hw(0, 0)?;
            self.state = MotorState::Stopped;
        }
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), ActuatorError> {
        self.set_power(0)
    }

    /// Scale every later command to `percent` (0–100) of its value.
    pub fn set_max_power_percent(&mut self, percent: i32) {
        self.max_power_percent = percent.clamp(0, 100);
    }

    pub fn max_power_percent(&self) -> i32 {
        self.max_power_percent
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.state, MotorState::Stopped)
    }

    fn set_duty_hw(&mut self, forward: u16, reverse: u16) -> Result<(), ActuatorError> {
        let full = MAX_POWER as u16;
        self.in0
            .set_duty_cycle_fraction(forward, full)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.in1
            .set_duty_cycle_fraction(reverse, full)
            .map_err(|_| ActuatorError::PwmWriteFailed)
    }
}
