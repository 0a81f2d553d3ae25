//! Control loop, the hexagonal core.
//!
//! [`ControlLoop`] owns every detector and regulator and runs them in a
//! fixed order once per camera exposure.  All I/O flows through port
//! traits injected at call sites, so the whole loop is testable with mock
//! adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          ControlLoop          │
//! ActuatorPort ◀──│ border · obstacle · PID · PI  │
//!                 └──────────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::{RobotConfig, CAMERA_IMAGE_SIZE, SCAN_IMAGE_SIZE};
use crate::control::pid::PidController;
use crate::control::speed::SpeedRegulator;
use crate::detection::obstacle::FixedPair;
use crate::detection::{Avoidance, BorderDetector, BorderReading, ObstacleAvoider, Sense, ServoScan};

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, EventSink, SensorPort, ServoChannel, Snapshot, Wheel};

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

/// Steering servo angle for driving straight.
pub const STEERING_CENTER_DEGREE: i32 = 90;

/// Line following with obstacle avoidance over an `N`-pixel camera.
pub struct ControlLoop<S, const N: usize = CAMERA_IMAGE_SIZE> {
    config: RobotConfig,
    border: BorderDetector<N>,
    obstacle: ObstacleAvoider<S>,
    steering: PidController,
    left: SpeedRegulator,
    right: SpeedRegulator,
    /// Seconds per cycle (derived from config).
    dt: f32,
    calibration_pending: bool,
    lane_visible: bool,
    tick_count: u64,
    last: TelemetryData,
}

impl<const N: usize> ControlLoop<FixedPair, N> {
    /// Loop for the chassis with two fixed proximity sensors.
    pub fn new(config: RobotConfig) -> Self {
        Self::with_sense(config, FixedPair::default())
    }
}

impl<const N: usize> ControlLoop<ServoScan<SCAN_IMAGE_SIZE>, N> {
    /// Loop for the chassis with the servo-swept proximity sensor.
    pub fn with_scanner(config: RobotConfig) -> Self {
        let scan = ServoScan::new(config.scan);
        Self::with_sense(config, scan)
    }
}

impl<S: Sense, const N: usize> ControlLoop<S, N> {
    /// Construct the loop around an obstacle sense.
    ///
    /// The border threshold is calibrated from the first image processed.
    pub fn with_sense(config: RobotConfig, sense: S) -> Self {
        Self {
            border: BorderDetector::new(config.border),
            obstacle: ObstacleAvoider::with_sense(config.obstacle, sense),
            steering: PidController::from_config(&config.steering),
            left: SpeedRegulator::new(config.speed),
            right: SpeedRegulator::new(config.speed),
            dt: cycle_secs(&config),
            calibration_pending: true,
            lane_visible: true,
            tick_count: 0,
            last: TelemetryData::default(),
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put the actuators in a known state: motors off, steering centred.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        hw.all_off();
        hw.set_servo_angle(ServoChannel::Steering, STEERING_CENTER_DEGREE);
        if let Some(angle) = self.obstacle.servo_command() {
            hw.set_servo_angle(ServoChannel::Scanner, angle);
        }
        sink.emit(&AppEvent::Started);
        info!("control loop started, cycle {} us", self.config.cycle_period_us);
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Capture a snapshot and run one cycle on it.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`]; this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort<S::Reading, N> + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> TelemetryData {
        let snapshot = hw.capture();
        self.step(&snapshot, hw, sink)
    }

    /// Run one cycle: borders → obstacle → steering → speed → actuators.
    pub fn step(
        &mut self,
        snapshot: &Snapshot<S::Reading, N>,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> TelemetryData {
        self.tick_count += 1;

        // 1. Lane borders
        if self.calibration_pending {
            self.calibration_pending = false;
            self.border
                .initialize(&snapshot.image, self.config.border.threshold_percent);
            sink.emit(&AppEvent::Calibrated {
                threshold: self.border.threshold(),
            });
        }
        self.border.find_border(&snapshot.image);
        let border = self.border.reading();
        self.track_lane(&border, sink);

        // 2. Obstacle arbitration
        let prev = self.obstacle.avoidance();
        let distance = snapshot.distance();
        let steering_error = self.obstacle.error(distance, &snapshot.proximity, &border);
        let avoidance = self.obstacle.avoidance();
        if avoidance != prev {
            sink.emit(&AppEvent::AvoidanceChanged {
                from: prev,
                to: avoidance,
            });
        }

        // 3. Steering
        let range = i32::from(self.config.steering_servo.min_max_angle);
        let deflection = self.steering.compute(steering_error as f32, self.dt).round() as i32;
        let steering_angle = STEERING_CENTER_DEGREE + deflection.clamp(-range, range);

        // 4. Wheel speed
        let left_power = self.left.regulate(snapshot.left_wheel.speed);
        let right_power = self.right.regulate(snapshot.right_wheel.speed);

        // 5. Actuators
        hw.set_servo_angle(ServoChannel::Steering, steering_angle);
        if let Some(angle) = self.obstacle.servo_command() {
            hw.set_servo_angle(ServoChannel::Scanner, angle);
        }
        hw.set_motor_power(Wheel::Left, left_power);
        hw.set_motor_power(Wheel::Right, right_power);

        self.last = TelemetryData {
            cycle: self.tick_count,
            left_border: border.left,
            right_border: border.right,
            border_error: border.error,
            steering_error,
            steering_angle,
            avoidance,
            desired_speed: self.left.desired_speed(),
            left_speed: snapshot.left_wheel.speed,
            right_speed: snapshot.right_wheel.speed,
            left_power,
            right_power,
            distance,
        };
        self.last
    }

    fn track_lane(&mut self, border: &BorderReading, sink: &mut impl EventSink) {
        let visible = border.left != 0 || border.right != N as i32;
        if visible == self.lane_visible {
            return;
        }
        self.lane_visible = visible;
        if visible {
            sink.emit(&AppEvent::LaneFound);
        } else {
            warn!("lane lost after {} cycles, driving straight", self.tick_count);
            sink.emit(&AppEvent::LaneLost);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (buttons, console, start gate).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::SetSpeed(speed) => {
                self.left.set_desired_speed(speed);
                self.right.set_desired_speed(speed);
                info!("desired speed {:.2} m/s", speed);
            }
            AppCommand::Stop => {
                self.left.set_desired_speed(0.0);
                self.right.set_desired_speed(0.0);
                self.left.reset();
                self.right.reset();
                hw.all_off();
                info!("stopped");
            }
            AppCommand::Calibrate => {
                self.calibration_pending = true;
            }
            AppCommand::UpdateConfig(config) => {
                self.apply_config(config);
                sink.emit(&AppEvent::ConfigReplaced);
                info!("configuration replaced at runtime");
            }
            AppCommand::SetObstacleAvoidance(enabled) => {
                self.config.obstacle.deactivated = !enabled;
                self.obstacle.set_config(self.config.obstacle);
                info!("obstacle avoidance {}", if enabled { "on" } else { "off" });
            }
            AppCommand::Reset => self.reset(),
        }
    }

    fn apply_config(&mut self, config: RobotConfig) {
        let desired = self.left.desired_speed();

        self.border.set_config(config.border);
        self.obstacle.set_config(config.obstacle);
        self.obstacle.set_scan_config(config.scan);
        self.steering = PidController::from_config(&config.steering);
        self.left.set_config(config.speed);
        self.right.set_config(config.speed);
        self.left.set_desired_speed(desired);
        self.right.set_desired_speed(desired);
        self.dt = cycle_secs(&config);
        self.config = config;
    }

    /// Return every detector and regulator to its initial state.
    ///
    /// The calibrated threshold and the desired speed survive.
    pub fn reset(&mut self) {
        self.border.reset();
        self.obstacle.reset();
        self.steering.reset();
        self.left.reset();
        self.right.reset();
        self.lane_visible = true;
        self.last = TelemetryData::default();
    }

    // ── Queries ───────────────────────────────────────────────

    /// Telemetry of the most recent cycle.
    pub fn build_telemetry(&self) -> TelemetryData {
        self.last
    }

    pub fn avoidance(&self) -> Avoidance {
        self.obstacle.avoidance()
    }

    pub fn border(&self) -> &BorderDetector<N> {
        &self.border
    }

    pub fn obstacle(&self) -> &ObstacleAvoider<S> {
        &self.obstacle
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

fn cycle_secs(config: &RobotConfig) -> f32 {
    config.cycle_period_us as f32 / 1_000_000.0
}
