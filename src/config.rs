//! Robot configuration parameters
//!
//! All tunable parameters of the control core.  Every struct is a plain
//! value object: components take a copy at construction and `set_config`
//! replaces it wholesale and resets dependent state.  Values are accepted
//! as-is; keeping them sane is the caller's job.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Number of pixels delivered by the line camera.
pub const CAMERA_IMAGE_SIZE: usize = 128;

/// Number of positions in one servo sweep of the obstacle scanner.
pub const SCAN_IMAGE_SIZE: usize = 30;

/// Full mechanical range of a hobby servo in degrees.
pub const SERVO_MAX_RANGE_DEGREE: i32 = 180;

/// Lane-border detector tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderConfig {
    /// Search radius (pixels) around the previous border.
    pub neighborhood: usize,
    /// Pixels ignored at each image edge when computing the threshold.
    pub edge_offset: usize,
    /// Threshold as a percentage of the brightest calibration pixel.
    /// Borders must be strictly brighter, so 100 rejects the calibration
    /// image's own lines.
    pub threshold_percent: u8,
    /// Percentage of the raw border error handed to steering.
    pub error_percent: i32,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            neighborhood: 6,
            edge_offset: 5,
            threshold_percent: 60,
            error_percent: 100,
        }
    }
}

/// PI speed regulator gains and start-up behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// Proportional gain.
    pub kp: f32,
    /// Integral gain.
    pub ki: f32,
    /// Upper bound of the integral term, as a fraction of full output.
    pub anti_windup: f32,
    /// Below this desired speed (m/s) the output is forced to zero.
    pub null_speed_threshold: f32,
    /// Output cap while the wheel is still below the null speed.
    pub null_speed_power: f32,
    /// Motor command corresponding to a normalised output of 1.0.
    pub max_power: i32,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            kp: 0.007,
            ki: 0.008,
            anti_windup: 0.5,
            null_speed_threshold: 0.05,
            null_speed_power: 0.2,
            max_power: 1000,
        }
    }
}

/// Steering PID, output in degrees around the servo centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub output_min: f32,
    pub output_max: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            kp: 2.5,
            ki: 0.0,
            kd: 0.8,
            output_min: -90.0,
            output_max: 90.0,
        }
    }
}

/// Obstacle avoidance state machine parameters (shared by both senses).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Raw proximity value that triggers avoidance.
    pub threshold_distance: u16,
    /// Margin (pixels) kept from the single visible lane line.
    pub move_from_obstacle: i32,
    /// Encoder distance (m) to commit to an avoidance manoeuvre.
    pub encoder_avoid_distance: f32,
    /// Keep tracking obstacles but never override the steering error.
    pub deactivated: bool,
    /// Image column treated as the track centre.
    pub track_center: i32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            threshold_distance: 23_000,
            move_from_obstacle: 18,
            encoder_avoid_distance: 0.8,
            deactivated: false,
            track_center: (CAMERA_IMAGE_SIZE / 2) as i32,
        }
    }
}

impl ObstacleConfig {
    /// Tuning used with the servo-swept sensor.
    pub fn scanning() -> Self {
        Self {
            threshold_distance: 48_000,
            move_from_obstacle: 15,
            ..Self::default()
        }
    }
}

/// Hobby servo geometry and pulse timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// Added to every commanded angle to trim the mechanical zero.
    pub correction_angle: i8,
    /// Allowed deflection either side of 90°.
    pub min_max_angle: u8,
    /// Angle (relative to centre) commanded at start-up.
    pub default_center_angle: i8,
    /// Servo interprets the pulse width mirrored.
    pub reverse_signal: bool,
    /// Pulse width for 0°.
    pub min_us: u16,
    /// Pulse width for 180°.
    pub max_us: u16,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            correction_angle: 0,
            min_max_angle: 90,
            default_center_angle: 0,
            reverse_signal: false,
            min_us: 900,
            max_us: 2100,
        }
    }
}

impl ServoConfig {
    /// Steering servo of the reference chassis.
    pub fn steering() -> Self {
        Self {
            correction_angle: -10,
            min_max_angle: 45,
            reverse_signal: true,
            ..Self::default()
        }
    }

    /// SG90 servo carrying the scanning proximity sensor.
    pub fn scanner() -> Self {
        Self {
            correction_angle: 5,
            min_max_angle: 60,
            min_us: 500,
            max_us: 2400,
            ..Self::default()
        }
    }

    /// Lowest reachable angle in degrees.
    pub fn min_angle(&self) -> i32 {
        90 - i32::from(self.min_max_angle) + i32::from(self.correction_angle)
    }

    /// Highest reachable angle in degrees.
    pub fn max_angle(&self) -> i32 {
        90 + i32::from(self.min_max_angle) + i32::from(self.correction_angle)
    }
}

/// Servo-swept obstacle sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub servo: ServoConfig,
    /// Raw reads averaged into one scan sample.
    pub samples_per_reading: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            servo: ServoConfig::scanner(),
            samples_per_reading: 10,
        }
    }
}

/// Wheel encoder geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub pulses_per_revolution: u32,
    /// Encoder revolutions per wheel revolution.
    pub gear_ratio: f32,
    pub wheel_circumference_mm: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            pulses_per_revolution: 400,
            gear_ratio: 78.0 / 36.0,
            wheel_circumference_mm: 204,
        }
    }
}

/// Full robot configuration handed to the control loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub border: BorderConfig,
    pub speed: SpeedConfig,
    pub steering: SteeringConfig,
    pub steering_servo: ServoConfig,
    pub obstacle: ObstacleConfig,
    pub scan: ScanConfig,
    pub encoder: EncoderConfig,
    /// Control loop period in microseconds.
    pub cycle_period_us: u32,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            border: BorderConfig::default(),
            speed: SpeedConfig::default(),
            steering: SteeringConfig::default(),
            steering_servo: ServoConfig::steering(),
            obstacle: ObstacleConfig::default(),
            scan: ScanConfig::default(),
            encoder: EncoderConfig::default(),
            cycle_period_us: 10_000, // 100 Hz
        }
    }
}

impl RobotConfig {
    /// Configuration for the chassis with the servo-mounted obstacle sensor.
    pub fn with_scanner() -> Self {
        Self {
            obstacle: ObstacleConfig::scanning(),
            ..Self::default()
        }
    }

    /// Parse a JSON document.  Missing sections and fields fall back to
    /// the defaults of their section type.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ConfigError::from(e).into())
    }

    /// Serialise to a JSON document.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ConfigError::from(e).into())
    }
}
