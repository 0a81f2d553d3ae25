//! Integration tests for the sampling → mailbox → control loop hand-over.

use linebot::app::mailbox::SnapshotMailbox;
use linebot::app::ports::Snapshot;
use linebot::app::service::ControlLoop;
use linebot::config::RobotConfig;
use linebot::detection::obstacle::FixedPair;
use linebot::sensors::proximity::ProximityPair;

use crate::mock_hw::{track, MockRobot, RecordingSink};

#[test]
fn control_loop_runs_on_newest_snapshot() {
    let mut cl: ControlLoop<FixedPair> = ControlLoop::new(RobotConfig::default());
    let mut hw = MockRobot::new(Snapshot::new(track(30, 98), ProximityPair::default()));
    let mut sink = RecordingSink::new();
    let mailbox = SnapshotMailbox::new();

    // Sampler is faster than the loop: only the second image is processed.
    mailbox.post(Snapshot::new(track(30, 98), ProximityPair::default()));
    mailbox.post(Snapshot::new(track(40, 108), ProximityPair::default()));

    let snapshot = mailbox.take().unwrap();
    let t = cl.step(&snapshot, &mut hw, &mut sink);
    assert_eq!((t.left_border, t.right_border), (40, 108));
    assert!(!mailbox.is_pending());
}

#[test]
fn loop_skips_cycle_without_fresh_snapshot() {
    let mut cl: ControlLoop<FixedPair> = ControlLoop::new(RobotConfig::default());
    let mut hw = MockRobot::new(Snapshot::new(track(30, 98), ProximityPair::default()));
    let mut sink = RecordingSink::new();
    let mailbox = SnapshotMailbox::<ProximityPair>::new();

    for _ in 0..3 {
        if let Some(snapshot) = mailbox.take() {
            cl.step(&snapshot, &mut hw, &mut sink);
        }
    }
    assert_eq!(cl.tick_count(), 0);
    assert!(hw.calls.is_empty());
}
