//! Linebot host simulator.
//!
//! Drives the real [`ControlLoop`] against a synthetic straight track with
//! a slow curve, an optional obstacle and first-order wheel dynamics.
//!
//! ```text
//! ┌──────────────┐  Snapshot   ┌─────────────┐  power / angles  ┌──────────────┐
//! │  SimRobot    │ ──────────▶ │ ControlLoop │ ───────────────▶ │  SimRobot    │
//! │ (SensorPort) │             │             │                  │(ActuatorPort)│
//! └──────────────┘             └─────────────┘                  └──────────────┘
//!                                    │ AppEvent
//!                                    ▼
//!                              LogEventSink
//! ```
//!
//! ```bash
//! RUST_LOG=info cargo run --features sim -- --cycles 3000 --obstacle 4.0
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

// Host implementation of the critical section used by the mailbox.
use critical_section as _;

use linebot::adapters::log_sink::LogEventSink;
use linebot::app::commands::AppCommand;
use linebot::app::events::AppEvent;
use linebot::app::mailbox::SnapshotMailbox;
use linebot::app::ports::{ActuatorPort, EventSink, SensorPort, ServoChannel, Snapshot, Wheel};
use linebot::app::service::{ControlLoop, STEERING_CENTER_DEGREE};
use linebot::config::{RobotConfig, CAMERA_IMAGE_SIZE};
use linebot::detection::Sense;
use linebot::image::LineImage;
use linebot::sensors::encoder::{Odometer, PulseCounter};
use linebot::sensors::proximity::{sample_burst, ProximityBurst, ProximityPair};
use linebot::sensors::WheelFeedback;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "linebot-sim")]
#[command(about = "Run the linebot control loop on a simulated track")]
struct Args {
    /// Number of control cycles to run
    #[arg(long, default_value_t = 2000)]
    cycles: u32,

    /// Desired cruising speed in m/s
    #[arg(long, default_value_t = 0.6)]
    speed: f32,

    /// Distance along the track at which an obstacle stands (m)
    #[arg(long)]
    obstacle: Option<f32>,

    /// Lane half the obstacle blocks
    #[arg(long, value_enum, default_value_t = ObstacleSide::Right)]
    side: ObstacleSide,

    /// Use the servo-swept sensor instead of the fixed pair
    #[arg(long)]
    scanner: bool,

    /// JSON configuration file; missing sections use the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log telemetry every N cycles (0 = never)
    #[arg(long, default_value_t = 100)]
    telemetry_every: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ObstacleSide {
    Left,
    Right,
}

// ── Track and robot model ─────────────────────────────────────

/// Pixel positions of the lane lines with the robot centred.
const LEFT_LINE_PX: f32 = 30.0;
const RIGHT_LINE_PX: f32 = 98.0;
const BACKGROUND: u16 = 300;
const LINE: u16 = 3000;
/// Lateral pixels per metre per degree of steering.
const STEERING_GAIN: f32 = 0.9;
/// Lateral drift per metre caused by the curve.
const CURVE_DRIFT: f32 = 4.0;
/// Wheel speed at full power (m/s) and time constant (s).
const TOP_SPEED: f32 = 2.5;
const WHEEL_TAU: f32 = 0.2;
/// Range (m) at which the proximity sensors start to see the obstacle.
const SENSOR_RANGE: f32 = 0.6;

struct SimWheel {
    speed: f32,
    power: i32,
    counter: PulseCounter,
    odometer: Odometer,
    pulse_residue: f32,
}

impl SimWheel {
    fn new(config: &RobotConfig) -> Self {
        Self {
            speed: 0.0,
            power: 0,
            counter: PulseCounter::new(),
            odometer: Odometer::new(config.encoder),
            pulse_residue: 0.0,
        }
    }

    fn advance(&mut self, dt: f32, metres_per_pulse: f32) {
        let target = self.power as f32 / 1000.0 * TOP_SPEED;
        self.speed += (target - self.speed) * dt / WHEEL_TAU;

        self.pulse_residue += self.speed.max(0.0) * dt / metres_per_pulse;
        while self.pulse_residue >= 1.0 {
            self.counter.record_pulse();
            self.pulse_residue -= 1.0;
        }
    }

    fn feedback(&mut self, period_us: u32) -> WheelFeedback {
        self.odometer.update(self.counter.take(), period_us);
        WheelFeedback::from_odometer(&self.odometer)
    }
}

struct SimRobot {
    period_us: u32,
    metres_per_pulse: f32,
    /// Lateral offset from the lane centre in pixels, positive = right.
    offset: f32,
    steering: i32,
    scanner: i32,
    obstacle: Option<(f32, ObstacleSide)>,
    samples_per_reading: usize,
    left: SimWheel,
    right: SimWheel,
}

impl SimRobot {
    fn new(config: &RobotConfig, obstacle: Option<(f32, ObstacleSide)>) -> Self {
        let e = config.encoder;
        let metres_per_pulse = e.wheel_circumference_mm as f32
            / (e.pulses_per_revolution as f32 * e.gear_ratio)
            / 1000.0;
        Self {
            period_us: config.cycle_period_us,
            metres_per_pulse,
            offset: 0.0,
            steering: STEERING_CENTER_DEGREE,
            scanner: STEERING_CENTER_DEGREE,
            obstacle,
            samples_per_reading: config.scan.samples_per_reading,
            left: SimWheel::new(config),
            right: SimWheel::new(config),
        }
    }

    fn distance(&self) -> f32 {
        (self.left.odometer.distance() + self.right.odometer.distance()) / 2.0
    }

    /// Advance the physics by one cycle.
    fn advance(&mut self) {
        let dt = self.period_us as f32 / 1_000_000.0;
        self.left.advance(dt, self.metres_per_pulse);
        self.right.advance(dt, self.metres_per_pulse);

        let travelled = (self.left.speed + self.right.speed) / 2.0 * dt;
        let deflection = (self.steering - STEERING_CENTER_DEGREE) as f32;
        self.offset += travelled * (STEERING_GAIN * deflection + CURVE_DRIFT);
    }

    fn image(&self) -> LineImage {
        let mut image = [BACKGROUND; CAMERA_IMAGE_SIZE];
        for line in [LEFT_LINE_PX, RIGHT_LINE_PX] {
            let px = (line - self.offset).round();
            if px >= 0.0 && (px as usize) < CAMERA_IMAGE_SIZE {
                image[px as usize] = LINE;
            }
        }
        image
    }

    /// Raw proximity value seen looking at `side`.
    fn proximity(&self, side: ObstacleSide) -> u16 {
        let Some((at, obstacle_side)) = self.obstacle else {
            return 500;
        };
        let gap = at - self.distance();
        if side != obstacle_side || !(0.0..SENSOR_RANGE).contains(&gap) {
            return 500;
        }
        500 + (59_000.0 * (1.0 - gap / SENSOR_RANGE)) as u16
    }

    fn snapshot<R>(&mut self, proximity: R) -> Snapshot<R> {
        let mut snapshot = Snapshot::new(self.image(), proximity);
        snapshot.left_wheel = self.left.feedback(self.period_us);
        snapshot.right_wheel = self.right.feedback(self.period_us);
        snapshot
    }
}

impl SensorPort<ProximityPair> for SimRobot {
    fn capture(&mut self) -> Snapshot<ProximityPair> {
        let pair = ProximityPair {
            left: self.proximity(ObstacleSide::Left),
            right: self.proximity(ObstacleSide::Right),
        };
        self.snapshot(pair)
    }
}

impl SensorPort<ProximityBurst> for SimRobot {
    fn capture(&mut self) -> Snapshot<ProximityBurst> {
        let side = if self.scanner < STEERING_CENTER_DEGREE {
            ObstacleSide::Left
        } else {
            ObstacleSide::Right
        };
        let value = self.proximity(side);
        let burst = sample_burst(&mut || value, self.samples_per_reading);
        self.snapshot(burst)
    }
}

impl ActuatorPort for SimRobot {
    fn set_motor_power(&mut self, wheel: Wheel, power: i32) {
        match wheel {
            Wheel::Left => self.left.power = power,
            Wheel::Right => self.right.power = power,
        }
    }

    fn set_servo_angle(&mut self, servo: ServoChannel, degree: i32) {
        match servo {
            ServoChannel::Steering => self.steering = degree,
            ServoChannel::Scanner => self.scanner = degree,
        }
    }

    fn all_off(&mut self) {
        self.left.power = 0;
        self.right.power = 0;
    }
}

// ── Main ──────────────────────────────────────────────────────

fn load_config(args: &Args) -> Result<RobotConfig> {
    let Some(path) = &args.config else {
        return Ok(if args.scanner {
            RobotConfig::with_scanner()
        } else {
            RobotConfig::default()
        });
    };
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let config = RobotConfig::from_json(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

fn run<S: Sense>(mut control: ControlLoop<S>, robot: &mut SimRobot, args: &Args) -> f32
where
    SimRobot: SensorPort<S::Reading>,
{
    let mut sink = LogEventSink::new();
    control.start(robot, &mut sink);
    control.handle_command(AppCommand::SetSpeed(args.speed), robot, &mut sink);

    let mailbox = SnapshotMailbox::new();
    let mut worst_offset = 0.0_f32;
    for cycle in 1..=args.cycles {
        mailbox.post(<SimRobot as SensorPort<S::Reading>>::capture(robot));
        let Some(snapshot) = mailbox.take() else {
            continue;
        };
        let telemetry = control.step(&snapshot, robot, &mut sink);
        robot.advance();
        worst_offset = worst_offset.max(robot.offset.abs());

        if args.telemetry_every > 0 && cycle % args.telemetry_every == 0 {
            sink.emit(&AppEvent::Telemetry(telemetry));
        }
    }
    control.handle_command(AppCommand::Stop, robot, &mut sink);
    worst_offset
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(
        "simulating {} cycles at {:.2} m/s, {} sensor",
        args.cycles,
        args.speed,
        if args.scanner { "scanning" } else { "fixed pair" }
    );

    let obstacle = args.obstacle.map(|at| (at, args.side));
    let mut robot = SimRobot::new(&config, obstacle);
    let worst_offset = if args.scanner {
        run(ControlLoop::with_scanner(config), &mut robot, &args)
    } else {
        run(ControlLoop::new(config), &mut robot, &args)
    };

    info!(
        "done: {:.2} m travelled, worst lateral offset {:.1} px",
        robot.distance(),
        worst_offset
    );
    Ok(())
}
