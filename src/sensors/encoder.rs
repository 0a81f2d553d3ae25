//! Optical wheel encoder odometry.
//!
//! The encoder disc produces `pulses_per_revolution` edges per encoder
//! revolution; a gear stage sits between the encoder and the wheel.  An
//! edge interrupt increments a [`PulseCounter`]; once per control cycle
//! the loop drains it and feeds the count into an [`Odometer`], which
//! derives wheel speed and accumulated distance.
//!
//! The counter uses `AtomicU32` so the interrupt and the control loop can
//! share it without a lock.  The control loop never registers callbacks;
//! it only polls.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::EncoderConfig;

/// Lock-free pulse accumulator shared between an edge interrupt and the
/// control loop.
#[derive(Debug, Default)]
pub struct PulseCounter {
    count: AtomicU32,
}

impl PulseCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Record one edge.  Safe to call from interrupt context.
    pub fn record_pulse(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Atomically read and clear the pulses seen since the last call.
    pub fn take(&self) -> u32 {
        self.count.swap(0, Ordering::Relaxed)
    }
}

/// Wheel speed and distance derived from encoder pulses.
#[derive(Debug, Clone)]
pub struct Odometer {
    config: EncoderConfig,
    speed: f32,
    distance_count: u64,
}

impl Odometer {
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            speed: 0.0,
            distance_count: 0,
        }
    }

    /// Account for `pulses` seen over the last `elapsed_us` microseconds.
    ///
    /// Returns the new speed in m/s.  A zero interval yields zero speed but
    /// the pulses still count towards the distance.
    pub fn update(&mut self, pulses: u32, elapsed_us: u32) -> f32 {
        self.speed = if elapsed_us > 0 {
            // mm/µs × 1000 = m/s
            1000.0 * self.config.wheel_circumference_mm as f32 * pulses as f32
                / (self.pulses_per_wheel_revolution() * elapsed_us as f32)
        } else {
            0.0
        };
        self.distance_count += u64::from(pulses);
        self.speed
    }

    /// Speed computed by the last [`update`](Self::update), in m/s.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Distance travelled since start-up or the last reset, in metres.
    pub fn distance(&self) -> f32 {
        let mm = self.config.wheel_circumference_mm as f32 * self.distance_count as f32
            / self.pulses_per_wheel_revolution();
        mm / 1000.0
    }

    /// Restart the distance measurement.
    pub fn reset_distance(&mut self) {
        self.distance_count = 0;
    }

    fn pulses_per_wheel_revolution(&self) -> f32 {
        self.config.pulses_per_revolution as f32 * self.config.gear_ratio
    }
}

impl Default for Odometer {
    fn default() -> Self {
        Self::new(EncoderConfig::default())
    }
}
