//! Obstacle avoidance state machine.
//!
//! ```text
//!            obstacle seen on the left            travelled ≥ avoid distance
//!   ┌──────┐ ─────────────────────────▶ ┌──────────────┐ ──────────┐
//!   │ None │                            │ AvoidingLeft │           │
//!   └──────┘ ◀───────────────────────── └──────────────┘           │
//!      │  ▲                                                        │
//!      │  └────────────────────────────────────────────────────────┘
//!      │     anything else seen          ┌───────────────┐
//!      └───────────────────────────────▶ │ AvoidingRight │ ──▶ None (same rule)
//!                                        └───────────────┘
//! ```
//!
//! While avoiding, the steering error is no longer centred between the two
//! lane lines: the robot follows the single line on the side away from the
//! obstacle, offset by `move_from_obstacle` pixels.  Once triggered the
//! manoeuvre is held for a fixed encoder distance, whatever the sensors say,
//! so the robot does not oscillate around the obstacle edge.
//!
//! How obstacles are seen is a [`Sense`] capability: two fixed sensors
//! ([`FixedPair`]) or one sensor swept by a servo
//! ([`ServoScan`](super::scan::ServoScan)).  The transition logic is shared.

use log::info;

use crate::config::{ObstacleConfig, ScanConfig, SCAN_IMAGE_SIZE};
use crate::sensors::proximity::ProximityPair;

use super::border::BorderReading;
use super::scan::ServoScan;

/// Side of the track an obstacle was seen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Avoidance state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Avoidance {
    #[default]
    None,
    /// Obstacle on the left: follow the right line only.
    AvoidingLeft,
    /// Obstacle on the right: follow the left line only.
    AvoidingRight,
}

impl Avoidance {
    /// -1 = left, 1 = right, 0 = nothing.
    pub fn as_integer(self) -> i32 {
        match self {
            Self::None => 0,
            Self::AvoidingLeft => -1,
            Self::AvoidingRight => 1,
        }
    }
}

impl From<Side> for Avoidance {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Self::AvoidingLeft,
            Side::Right => Self::AvoidingRight,
        }
    }
}

/// How an obstacle detector perceives its surroundings.
pub trait Sense {
    /// Raw data delivered for one cycle.
    type Reading;

    /// Absorb this cycle's reading.  Called every cycle, avoiding or not.
    fn update(&mut self, reading: &Self::Reading);

    /// Side of an obstacle at or beyond `threshold`, if any.
    ///
    /// Only consulted while no manoeuvre is in progress.
    fn detect(&mut self, threshold: u16) -> Option<Side>;

    /// Angle a scanning servo must be moved to after the last update.
    fn servo_command(&self) -> Option<i32> {
        None
    }

    /// Apply new scanner geometry.  Fixed sensors ignore it.
    fn configure_scan(&mut self, _scan: ScanConfig) {}
}

/// Two fixed proximity sensors looking front-left and front-right.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPair {
    last: ProximityPair,
}

impl FixedPair {
    pub fn left_value(&self) -> u16 {
        self.last.left
    }

    pub fn right_value(&self) -> u16 {
        self.last.right
    }
}

impl Sense for FixedPair {
    type Reading = ProximityPair;

    fn update(&mut self, reading: &ProximityPair) {
        self.last = *reading;
    }

    fn detect(&mut self, threshold: u16) -> Option<Side> {
        let ProximityPair { left, right } = self.last;
        if left < threshold && right < threshold {
            return None;
        }
        if left > threshold {
            Some(Side::Left)
        } else {
            Some(Side::Right)
        }
    }
}

/// Obstacle avoidance arbiter over a sense capability `S`.
#[derive(Debug, Clone)]
pub struct ObstacleAvoider<S> {
    config: ObstacleConfig,
    sense: S,
    state: Avoidance,
    encoder_distance_start: f32,
}

/// Detector with two fixed sensors.
pub type ObstacleDetector = ObstacleAvoider<FixedPair>;

/// Detector with one servo-swept sensor.
pub type ObstacleDetectorWithServo<const M: usize = SCAN_IMAGE_SIZE> = ObstacleAvoider<ServoScan<M>>;

impl<S: Sense> ObstacleAvoider<S> {
    pub fn with_sense(config: ObstacleConfig, sense: S) -> Self {
        Self {
            config,
            sense,
            state: Avoidance::None,
            encoder_distance_start: 0.0,
        }
    }

    /// Feed one cycle of sensor data and advance the state machine.
    ///
    /// `encoder_distance` is the distance (m) reported by one wheel encoder.
    pub fn update(&mut self, encoder_distance: f32, reading: &S::Reading) -> Avoidance {
        self.sense.update(reading);

        match self.state {
            Avoidance::None => {
                if let Some(side) = self.sense.detect(self.config.threshold_distance) {
                    self.state = side.into();
                    self.encoder_distance_start = encoder_distance;
                    info!(
                        "obstacle on the {:?} side at {:.2} m, avoiding",
                        side, encoder_distance
                    );
                }
            }
            Avoidance::AvoidingLeft | Avoidance::AvoidingRight => {
                if encoder_distance >= self.encoder_distance_start + self.config.encoder_avoid_distance {
                    info!("obstacle passed at {:.2} m", encoder_distance);
                    self.state = Avoidance::None;
                }
            }
        }
        self.state
    }

    /// Steering error for the current state.
    ///
    /// Passes the border error through unless a manoeuvre is active and the
    /// detector is enabled.
    pub fn compute_error(&self, border: &BorderReading) -> i32 {
        if self.config.deactivated {
            return border.error;
        }
        let center = self.config.track_center;
        let margin = self.config.move_from_obstacle;
        match self.state {
            Avoidance::None => border.error,
            Avoidance::AvoidingLeft => border.left - (center - margin),
            Avoidance::AvoidingRight => border.right - (center + margin),
        }
    }

    /// [`update`](Self::update) followed by [`compute_error`](Self::compute_error).
    pub fn error(&mut self, encoder_distance: f32, reading: &S::Reading, border: &BorderReading) -> i32 {
        self.update(encoder_distance, reading);
        self.compute_error(border)
    }

    pub fn avoidance(&self) -> Avoidance {
        self.state
    }

    /// -1 = avoiding left, 1 = avoiding right, 0 = nothing.
    pub fn avoidance_integer(&self) -> i32 {
        self.state.as_integer()
    }

    pub fn sense(&self) -> &S {
        &self.sense
    }

    pub fn config(&self) -> ObstacleConfig {
        self.config
    }

    /// Replace the configuration and return to `None`.
    pub fn set_config(&mut self, config: ObstacleConfig) {
        self.config = config;
        self.reset();
    }

    /// Replace the scanner geometry (restarting a sweep) and return to `None`.
    pub fn set_scan_config(&mut self, scan: ScanConfig) {
        self.sense.configure_scan(scan);
        self.reset();
    }

    /// Scanner servo angle for this cycle, if the sense has one.
    pub fn servo_command(&self) -> Option<i32> {
        self.sense.servo_command()
    }

    /// Abort any manoeuvre in progress.
    pub fn reset(&mut self) {
        self.encoder_distance_start = 0.0;
        self.state = Avoidance::None;
    }
}

impl ObstacleAvoider<FixedPair> {
    pub fn new(config: ObstacleConfig) -> Self {
        Self::with_sense(config, FixedPair::default())
    }

    /// Last value read from the left sensor.
    pub fn left_sensor_value(&self) -> u16 {
        self.sense.left_value()
    }

    /// Last value read from the right sensor.
    pub fn right_sensor_value(&self) -> u16 {
        self.sense.right_value()
    }
}

impl<const M: usize> ObstacleAvoider<ServoScan<M>> {
    pub fn with_servo(config: ObstacleConfig, scan: ScanConfig) -> Self {
        Self::with_sense(config, ServoScan::new(scan))
    }

    /// Angle the scanner servo should be driven to this cycle.
    pub fn servo_position_degree(&self) -> i32 {
        self.sense.servo_position_degree()
    }

    /// Averaged sensor reading of the last cycle.
    pub fn sensor_value(&self) -> u16 {
        self.sense.sensor_value()
    }

    /// Scan value that triggered the last manoeuvre.
    pub fn distance_that_triggered(&self) -> u16 {
        self.sense.distance_that_triggered()
    }

    /// Servo angle for scan position `index`.
    pub fn servo_angle(&self, index: usize) -> i32 {
        self.sense.servo_angle(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::proximity::ProximityBurst;

    const QUIET: ProximityPair = ProximityPair { left: 100, right: 100 };

    fn border() -> BorderReading {
        BorderReading {
            left: 30,
            right: 100,
            error: 3,
        }
    }

    fn detector() -> ObstacleDetector {
        ObstacleDetector::new(ObstacleConfig {
            encoder_avoid_distance: 0.5,
            ..ObstacleConfig::default()
        })
    }

    fn left_hit() -> ProximityPair {
        ProximityPair { left: 30_000, right: 100 }
    }

    #[test]
    fn quiet_sensors_pass_border_error_through() {
        let mut det = detector();
        for d in 0..10 {
            assert_eq!(det.error(d as f32 * 0.1, &QUIET, &border()), 3);
        }
        assert_eq!(det.avoidance(), Avoidance::None);
        assert_eq!(det.left_sensor_value(), 100);
    }

    #[test]
    fn left_obstacle_follows_right_line() {
        let mut det = detector();
        let err = det.error(1.0, &left_hit(), &border());
        assert_eq!(det.avoidance(), Avoidance::AvoidingLeft);
        assert_eq!(det.avoidance_integer(), -1);
        // 30 - (64 - 18)
        assert_eq!(err, -16);
    }

    #[test]
    fn right_obstacle_follows_left_line() {
        let mut det = detector();
        let hit = ProximityPair { left: 100, right: 30_000 };
        let err = det.error(1.0, &hit, &border());
        assert_eq!(det.avoidance(), Avoidance::AvoidingRight);
        assert_eq!(det.avoidance_integer(), 1);
        // 100 - (64 + 18)
        assert_eq!(err, 18);
    }

    #[test]
    fn both_sensors_prefer_left() {
        let mut det = detector();
        det.update(0.0, &ProximityPair { left: 30_000, right: 30_000 });
        assert_eq!(det.avoidance(), Avoidance::AvoidingLeft);
    }

    #[test]
    fn left_exactly_at_threshold_avoids_right() {
        let mut det = detector();
        let threshold = det.config().threshold_distance;
        det.update(0.0, &ProximityPair { left: threshold, right: 0 });
        assert_eq!(det.avoidance(), Avoidance::AvoidingRight);
    }

    #[test]
    fn manoeuvre_is_held_for_avoid_distance() {
        let mut det = detector();
        det.update(1.0, &left_hit());
        assert_eq!(det.avoidance(), Avoidance::AvoidingLeft);

        // New triggers on the other side are ignored while committed.
        let right_hit = ProximityPair { left: 0, right: 60_000 };
        for d in [1.0, 1.1, 1.25, 1.4, 1.49] {
            assert_eq!(det.update(d, &right_hit), Avoidance::AvoidingLeft);
            assert_eq!(det.update(d, &QUIET), Avoidance::AvoidingLeft);
        }

        assert_eq!(det.update(1.5, &left_hit()), Avoidance::None);
        assert_eq!(det.compute_error(&border()), 3);
    }

    #[test]
    fn retriggers_on_cycle_after_release() {
        let mut det = detector();
        det.update(0.0, &left_hit());
        assert_eq!(det.update(0.5, &left_hit()), Avoidance::None);
        assert_eq!(det.update(0.51, &left_hit()), Avoidance::AvoidingLeft);
    }

    #[test]
    fn deactivated_detector_tracks_but_never_steers() {
        let mut det = ObstacleDetector::new(ObstacleConfig {
            deactivated: true,
            ..ObstacleConfig::default()
        });
        assert_eq!(det.error(0.0, &left_hit(), &border()), 3);
        assert_eq!(det.avoidance(), Avoidance::AvoidingLeft);
    }

    #[test]
    fn default_center_is_pinned_to_64() {
        // Fixed-centre behaviour of the reference firmware.
        let mut det = ObstacleDetector::new(ObstacleConfig::default());
        det.update(0.0, &left_hit());
        let b = BorderReading { left: 54, right: 70, error: -2 };
        assert_eq!(det.compute_error(&b), 54 - 46);

        let mut det = ObstacleDetector::new(ObstacleConfig::default());
        det.update(0.0, &ProximityPair { left: 0, right: 40_000 });
        assert_eq!(det.compute_error(&b), 70 - 82);
    }

    #[test]
    fn center_follows_configured_image_width() {
        let mut det = ObstacleDetector::new(ObstacleConfig {
            track_center: 32,
            move_from_obstacle: 8,
            ..ObstacleConfig::default()
        });
        det.update(0.0, &left_hit());
        let b = BorderReading { left: 10, right: 60, error: 0 };
        assert_eq!(det.compute_error(&b), 10 - 24);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut det = detector();
        det.update(0.0, &left_hit());
        det.reset();
        let once = (det.avoidance(), det.compute_error(&border()));
        det.reset();
        let twice = (det.avoidance(), det.compute_error(&border()));
        assert_eq!(once, twice);
        assert_eq!(once.0, Avoidance::None);
    }

    #[test]
    fn set_config_aborts_manoeuvre() {
        let mut det = detector();
        det.update(0.0, &left_hit());
        det.set_config(ObstacleConfig::default());
        assert_eq!(det.avoidance(), Avoidance::None);
    }

    fn burst(value: u16) -> ProximityBurst {
        ProximityBurst::from_slice(&[value; 10]).unwrap()
    }

    #[test]
    fn servo_detector_shares_state_machine() {
        let mut det =
            ObstacleDetectorWithServo::<30>::with_servo(ObstacleConfig::scanning(), ScanConfig::default());

        // Sweep from the left edge; position 2 sees the obstacle.
        det.update(0.0, &burst(1_000));
        det.update(0.0, &burst(1_000));
        assert_eq!(det.avoidance(), Avoidance::None);
        det.update(0.1, &burst(50_000));
        assert_eq!(det.avoidance(), Avoidance::AvoidingLeft);
        assert_eq!(det.distance_that_triggered(), 50_000);
        assert_eq!(det.sensor_value(), 50_000);

        // Committed for 0.8 m, scan keeps sweeping meanwhile.
        let angle_before = det.servo_position_degree();
        assert_eq!(det.update(0.5, &burst(0)), Avoidance::AvoidingLeft);
        assert_ne!(det.servo_position_degree(), angle_before);

        // Released once 0.8 m are covered; the stale reading still sits in
        // the scan image, so the next cycle triggers again.
        assert_eq!(det.update(1.0, &burst(0)), Avoidance::None);
        assert_eq!(det.update(1.0, &burst(0)), Avoidance::AvoidingLeft);
    }

    #[test]
    fn servo_detector_error_matches_fixed_variant() {
        let mut det =
            ObstacleDetectorWithServo::<30>::with_servo(ObstacleConfig::scanning(), ScanConfig::default());
        for i in 0..30 {
            det.update(0.0, &burst(if i == 25 { 60_000 } else { 0 }));
        }
        assert_eq!(det.avoidance(), Avoidance::AvoidingRight);
        // 100 - (64 + 15)
        assert_eq!(det.compute_error(&border()), 21);
    }

    #[test]
    fn set_scan_config_restarts_sweep() {
        let mut det =
            ObstacleDetectorWithServo::<30>::with_servo(ObstacleConfig::scanning(), ScanConfig::default());
        det.update(0.0, &burst(60_000));
        det.set_scan_config(ScanConfig::default());
        assert_eq!(det.avoidance(), Avoidance::None);
        assert_eq!(det.servo_angle(0), 35);
        assert!(det.sense().image().iter().all(|&v| v == 0));
    }
}
