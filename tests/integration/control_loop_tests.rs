//! Integration tests for the ControlLoop → ports pipeline.
//!
//! Every cycle goes through the mock sensor port and ends in recorded
//! actuator calls, so these tests check the full chain from camera image
//! and proximity readings down to motor power and servo angles.

use linebot::app::commands::AppCommand;
use linebot::app::events::AppEvent;
use linebot::app::ports::{ServoChannel, Snapshot, Wheel};
use linebot::app::service::ControlLoop;
use linebot::config::RobotConfig;
use linebot::detection::obstacle::FixedPair;
use linebot::detection::{Avoidance, ServoScan};
use linebot::sensors::proximity::{ProximityBurst, ProximityPair};

use crate::mock_hw::{moving, track, ActuatorCall, MockRobot, RecordingSink};

const QUIET: ProximityPair = ProximityPair { left: 500, right: 500 };
const LEFT_HIT: ProximityPair = ProximityPair {
    left: 30_000,
    right: 500,
};

fn fixed_loop() -> (ControlLoop<FixedPair>, MockRobot<ProximityPair>, RecordingSink) {
    let mut cl = ControlLoop::new(RobotConfig::default());
    let mut hw = MockRobot::new(Snapshot::new(track(30, 98), QUIET));
    let mut sink = RecordingSink::new();
    cl.start(&mut hw, &mut sink);
    (cl, hw, sink)
}

fn burst(value: u16) -> ProximityBurst {
    ProximityBurst::from_slice(&[value; 10]).unwrap()
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_stops_motors_and_centres_steering() {
    let (_, hw, sink) = fixed_loop();
    assert_eq!(hw.calls[0], ActuatorCall::AllOff);
    assert_eq!(hw.last_angle(ServoChannel::Steering), Some(90));
    assert_eq!(hw.last_angle(ServoChannel::Scanner), None);
    assert_eq!(sink.events, vec![AppEvent::Started]);
}

#[test]
fn first_cycle_calibrates_from_the_image() {
    let (mut cl, mut hw, mut sink) = fixed_loop();
    cl.tick(&mut hw, &mut sink);
    // 60 % of the 3000 line peak
    assert_eq!(cl.border().threshold(), 1800);
    assert!(sink.events.contains(&AppEvent::Calibrated { threshold: 1800 }));
}

// ── Steering ──────────────────────────────────────────────────

#[test]
fn centred_robot_drives_straight() {
    let (mut cl, mut hw, mut sink) = fixed_loop();
    for _ in 0..10 {
        let t = cl.tick(&mut hw, &mut sink);
        assert_eq!((t.left_border, t.right_border), (30, 98));
        assert_eq!(t.steering_error, 0);
    }
    assert_eq!(hw.last_angle(ServoChannel::Steering), Some(90));
}

#[test]
fn steering_turns_away_from_the_nearer_line() {
    // Left line close to the centre: steer right.
    let (mut cl, mut hw, mut sink) = fixed_loop();
    hw.push(Snapshot::new(track(40, 108), QUIET));
    let t = cl.tick(&mut hw, &mut sink);
    assert_eq!(t.border_error, 10);
    assert!(hw.last_angle(ServoChannel::Steering).unwrap() > 90);

    // Right line close to the centre: steer left.
    let (mut cl, mut hw, mut sink) = fixed_loop();
    hw.push(Snapshot::new(track(20, 88), QUIET));
    let t = cl.tick(&mut hw, &mut sink);
    assert_eq!(t.border_error, -10);
    assert!(hw.last_angle(ServoChannel::Steering).unwrap() < 90);
}

#[test]
fn lost_lane_falls_back_to_straight_ahead() {
    let (mut cl, mut hw, mut sink) = fixed_loop();
    hw.push(Snapshot::new(track(40, 108), QUIET));
    cl.tick(&mut hw, &mut sink);

    for _ in 0..2 {
        hw.push(Snapshot::new([0; 128], QUIET));
        let t = cl.tick(&mut hw, &mut sink);
        assert_eq!((t.left_border, t.right_border, t.border_error), (0, 128, 0));
    }
    assert!(sink.events.contains(&AppEvent::LaneLost));
    assert_eq!(hw.last_angle(ServoChannel::Steering), Some(90));

    cl.tick(&mut hw, &mut sink);
    assert_eq!(sink.events.last(), Some(&AppEvent::LaneFound));
}

// ── Speed ─────────────────────────────────────────────────────

#[test]
fn standing_robot_gets_bounded_kick() {
    let (mut cl, mut hw, mut sink) = fixed_loop();
    cl.handle_command(AppCommand::SetSpeed(2.0), &mut hw, &mut sink);
    for _ in 0..200 {
        let t = cl.tick(&mut hw, &mut sink);
        assert!(t.left_power <= 200, "kick exceeded: {}", t.left_power);
        assert_eq!(t.left_power, t.right_power);
    }
}

#[test]
fn slow_wheels_get_increasing_power() {
    let (mut cl, mut hw, mut sink) = fixed_loop();
    cl.handle_command(AppCommand::SetSpeed(0.5), &mut hw, &mut sink);

    let mut powers = Vec::new();
    for i in 0..50 {
        hw.push(moving(track(30, 98), QUIET, 0.3, i as f32 * 0.003));
        powers.push(cl.tick(&mut hw, &mut sink).left_power);
    }
    assert!(powers.windows(2).all(|w| w[1] >= w[0]));
    assert!(powers[49] > powers[0]);
    assert_eq!(hw.last_power(Wheel::Left), Some(powers[49]));
    assert_eq!(hw.last_power(Wheel::Right), Some(powers[49]));
}

#[test]
fn stop_cuts_power_immediately_and_keeps_it_off() {
    let (mut cl, mut hw, mut sink) = fixed_loop();
    cl.handle_command(AppCommand::SetSpeed(0.5), &mut hw, &mut sink);
    hw.push(moving(track(30, 98), QUIET, 0.3, 0.0));
    cl.tick(&mut hw, &mut sink);
    assert!(hw.last_power(Wheel::Left).unwrap() > 0);

    cl.handle_command(AppCommand::Stop, &mut hw, &mut sink);
    assert_eq!(hw.calls.last(), Some(&ActuatorCall::AllOff));

    hw.push(moving(track(30, 98), QUIET, 0.4, 0.01));
    let t = cl.tick(&mut hw, &mut sink);
    assert_eq!((t.left_power, t.right_power), (0, 0));
}

// ── Obstacles: fixed pair ─────────────────────────────────────

#[test]
fn fixed_pair_avoidance_is_held_for_the_commit_distance() {
    let (mut cl, mut hw, mut sink) = fixed_loop();

    let mut states = Vec::new();
    for i in 0..12 {
        let distance = i as f32 * 0.25;
        let proximity = if (4..7).contains(&i) { LEFT_HIT } else { QUIET };
        hw.push(moving(track(30, 98), proximity, 0.5, distance));
        let t = cl.tick(&mut hw, &mut sink);
        states.push(t.avoidance);
        if t.avoidance == Avoidance::AvoidingLeft {
            // 30 - (64 - 18)
            assert_eq!(t.steering_error, -16);
        }
    }

    // Triggered at 1.0 m, released at the first cycle at or beyond 1.8 m.
    let expected: Vec<_> = (0..12)
        .map(|i| {
            if (4..8).contains(&i) {
                Avoidance::AvoidingLeft
            } else {
                Avoidance::None
            }
        })
        .collect();
    assert_eq!(states, expected);
    assert_eq!(sink.avoidance_changes(), 2);
}

#[test]
fn disabled_avoidance_keeps_following_both_lines() {
    let (mut cl, mut hw, mut sink) = fixed_loop();
    cl.handle_command(AppCommand::SetObstacleAvoidance(false), &mut hw, &mut sink);
    hw.push(Snapshot::new(track(30, 98), LEFT_HIT));
    let t = cl.tick(&mut hw, &mut sink);
    assert_eq!(t.steering_error, t.border_error);
    assert_eq!(hw.last_angle(ServoChannel::Steering), Some(90));
}

// ── Obstacles: servo scanner ──────────────────────────────────

#[test]
fn scanner_sweeps_and_avoids_right_obstacle() {
    let mut cl: ControlLoop<ServoScan> = ControlLoop::with_scanner(RobotConfig::with_scanner());
    let mut hw = MockRobot::new(Snapshot::new(track(30, 98), burst(0)));
    let mut sink = RecordingSink::new();
    cl.start(&mut hw, &mut sink);

    for _ in 0..20 {
        let t = cl.tick(&mut hw, &mut sink);
        assert_eq!(t.avoidance, Avoidance::None);
    }
    // Sweep starts at the left end: 35° + 4° per step.
    let angles = hw.angles(ServoChannel::Scanner);
    assert_eq!(angles[0], 90);
    assert_eq!(&angles[1..4], &[39, 43, 47]);

    // Position 20 looks at 115°, right of centre.
    hw.push(Snapshot::new(track(30, 98), burst(60_000)));
    let t = cl.tick(&mut hw, &mut sink);
    assert_eq!(t.avoidance, Avoidance::AvoidingRight);
    // 98 - (64 + 15)
    assert_eq!(t.steering_error, 19);
    assert!(hw.last_angle(ServoChannel::Steering).unwrap() > 90);
    assert_eq!(cl.obstacle().distance_that_triggered(), 60_000);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn config_from_json_replaces_running_config() {
    let (mut cl, mut hw, mut sink) = fixed_loop();
    hw.push(Snapshot::new(track(30, 98), LEFT_HIT));
    cl.tick(&mut hw, &mut sink);
    assert_eq!(cl.avoidance(), Avoidance::AvoidingLeft);

    let config = RobotConfig::from_json(br#"{"obstacle": {"deactivated": true}}"#).unwrap();
    cl.handle_command(AppCommand::UpdateConfig(config), &mut hw, &mut sink);
    assert_eq!(cl.avoidance(), Avoidance::None);
    assert!(cl.config().obstacle.deactivated);
    assert_eq!(sink.events.last(), Some(&AppEvent::ConfigReplaced));
}

#[test]
fn calibrate_command_recomputes_threshold() {
    let (mut cl, mut hw, mut sink) = fixed_loop();
    cl.tick(&mut hw, &mut sink);
    assert_eq!(cl.border().threshold(), 1800);

    cl.handle_command(AppCommand::Calibrate, &mut hw, &mut sink);
    let mut dim = track(30, 98);
    dim[30] = 1000;
    dim[98] = 1000;
    hw.push(Snapshot::new(dim, QUIET));
    cl.tick(&mut hw, &mut sink);
    assert_eq!(cl.border().threshold(), 600);
}

#[test]
fn reset_command_is_idempotent() {
    let (mut cl, mut hw, mut sink) = fixed_loop();
    hw.push(Snapshot::new(track(30, 98), LEFT_HIT));
    cl.tick(&mut hw, &mut sink);

    cl.handle_command(AppCommand::Reset, &mut hw, &mut sink);
    let once = (cl.avoidance(), cl.border().left_border(), cl.border().right_border());
    cl.handle_command(AppCommand::Reset, &mut hw, &mut sink);
    let twice = (cl.avoidance(), cl.border().left_border(), cl.border().right_border());
    assert_eq!(once, twice);
    assert_eq!(once, (Avoidance::None, 0, 128));
}
