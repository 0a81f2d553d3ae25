//! Servo-swept proximity scanner.
//!
//! A single proximity sensor sits on a servo that sweeps back and forth
//! across the front of the robot.  Every cycle one averaged reading is
//! stored in a small scan image at the current sweep position, then the
//! position advances one step:
//!
//! ```text
//! index:  0 → 1 → … → M-1 → M-2 → … → 0 → 1 → …
//! angle:  min ─────────────▶ max ────────────▶ min
//! ```
//!
//! The brightest (closest) entry of the scan image tells where an obstacle
//! is; its index maps linearly back to a servo angle.

use crate::config::{ScanConfig, SCAN_IMAGE_SIZE};
use crate::image::argmax;
use crate::sensors::proximity::{average, ProximityBurst};

use super::obstacle::{Sense, Side};

/// Servo angle (degrees) that separates left from right obstacles.
pub const SCAN_CENTER_DEGREE: i32 = 90;

/// Sweep state and scan image of the servo-mounted sensor.
#[derive(Debug, Clone)]
pub struct ServoScan<const M: usize = SCAN_IMAGE_SIZE> {
    config: ScanConfig,
    image: [u16; M],
    index: usize,
    direction: i8,
    sensor_value: u16,
    servo_position_degree: i32,
    distance_that_triggered: u16,
}

impl<const M: usize> ServoScan<M> {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            image: [0; M],
            index: 0,
            direction: 1,
            sensor_value: 0,
            servo_position_degree: SCAN_CENTER_DEGREE,
            distance_that_triggered: 0,
        }
    }

    /// Servo angle for sweep position `index`.
    pub fn servo_angle(&self, index: usize) -> i32 {
        let min = self.config.servo.min_angle();
        let range = self.config.servo.max_angle() - min;
        min + range * index as i32 / M as i32
    }

    /// Angle the servo should be driven to this cycle.
    pub fn servo_position_degree(&self) -> i32 {
        self.servo_position_degree
    }

    /// Averaged reading stored during the last update.
    pub fn sensor_value(&self) -> u16 {
        self.sensor_value
    }

    /// Scan value that triggered the most recent detection.
    pub fn distance_that_triggered(&self) -> u16 {
        self.distance_that_triggered
    }

    /// Current sweep position.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn image(&self) -> &[u16; M] {
        &self.image
    }

    pub fn config(&self) -> ScanConfig {
        self.config
    }

    /// Replace the servo geometry and restart the sweep with a blank image.
    pub fn set_config(&mut self, config: ScanConfig) {
        *self = Self::new(config);
    }

    fn advance(&mut self) {
        if M < 2 {
            return;
        }
        if self.direction > 0 {
            self.index += 1;
            if self.index == M - 1 {
                self.direction = -1;
            }
        } else {
            self.index -= 1;
            if self.index == 0 {
                self.direction = 1;
            }
        }
    }
}

impl<const M: usize> Sense for ServoScan<M> {
    type Reading = ProximityBurst;

    fn update(&mut self, reading: &ProximityBurst) {
        let take = self.config.samples_per_reading.min(reading.len());
        self.sensor_value = average(&reading[..take]);
        if let Some(slot) = self.image.get_mut(self.index) {
            *slot = self.sensor_value;
        }

        self.advance();
        self.servo_position_degree = self.servo_angle(self.index);
    }

    fn detect(&mut self, threshold: u16) -> Option<Side> {
        let (index, value) = argmax(&self.image)?;
        if value < threshold {
            return None;
        }
        self.distance_that_triggered = value;

        if self.servo_angle(index) < SCAN_CENTER_DEGREE {
            Some(Side::Left)
        } else {
            Some(Side::Right)
        }
    }

    fn servo_command(&self) -> Option<i32> {
        Some(self.servo_position_degree)
    }

    fn configure_scan(&mut self, scan: ScanConfig) {
        self.set_config(scan);
    }
}

impl<const M: usize> Default for ServoScan<M> {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}
