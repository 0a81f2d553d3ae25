//! Mock hardware adapter for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history, and replays a queue of prepared snapshots through the sensor
//! port.

use std::collections::VecDeque;

use linebot::app::events::AppEvent;
use linebot::app::ports::{ActuatorPort, EventSink, SensorPort, ServoChannel, Snapshot, Wheel};
use linebot::config::CAMERA_IMAGE_SIZE;
use linebot::image::LineImage;
use linebot::sensors::WheelFeedback;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    Motor { wheel: Wheel, power: i32 },
    Servo { servo: ServoChannel, degree: i32 },
    AllOff,
}

// ── MockRobot ─────────────────────────────────────────────────

pub struct MockRobot<R> {
    pub calls: Vec<ActuatorCall>,
    pub queue: VecDeque<Snapshot<R>>,
    /// Returned once the queue is empty.
    pub idle: Snapshot<R>,
}

#[allow(dead_code)]
impl<R: Clone> MockRobot<R> {
    pub fn new(idle: Snapshot<R>) -> Self {
        Self {
            calls: Vec::new(),
            queue: VecDeque::new(),
            idle,
        }
    }

    pub fn push(&mut self, snapshot: Snapshot<R>) {
        self.queue.push_back(snapshot);
    }

    pub fn last_power(&self, wheel: Wheel) -> Option<i32> {
        self.calls.iter().rev().find_map(|c| match *c {
            ActuatorCall::Motor { wheel: w, power } if w == wheel => Some(power),
            ActuatorCall::AllOff => Some(0),
            _ => None,
        })
    }

    pub fn last_angle(&self, servo: ServoChannel) -> Option<i32> {
        self.calls.iter().rev().find_map(|c| match *c {
            ActuatorCall::Servo { servo: s, degree } if s == servo => Some(degree),
            _ => None,
        })
    }

    pub fn angles(&self, servo: ServoChannel) -> Vec<i32> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                ActuatorCall::Servo { servo: s, degree } if s == servo => Some(degree),
                _ => None,
            })
            .collect()
    }
}

impl<R: Clone> SensorPort<R> for MockRobot<R> {
    fn capture(&mut self) -> Snapshot<R> {
        self.queue.pop_front().unwrap_or_else(|| self.idle.clone())
    }
}

impl<R> ActuatorPort for MockRobot<R> {
    fn set_motor_power(&mut self, wheel: Wheel, power: i32) {
        self.calls.push(ActuatorCall::Motor { wheel, power });
    }

    fn set_servo_angle(&mut self, servo: ServoChannel, degree: i32) {
        self.calls.push(ActuatorCall::Servo { servo, degree });
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn avoidance_changes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::AvoidanceChanged { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Track helpers ─────────────────────────────────────────────

/// Uniform background with one bright line at each index.
pub fn track(left: usize, right: usize) -> LineImage {
    let mut image = [200; CAMERA_IMAGE_SIZE];
    image[left] = 3000;
    image[right] = 3000;
    image
}

/// Snapshot with both wheels at `speed` having covered `distance`.
#[allow(dead_code)]
pub fn moving<R>(image: LineImage, proximity: R, speed: f32, distance: f32) -> Snapshot<R> {
    let wheel = WheelFeedback { speed, distance };
    let mut snapshot = Snapshot::new(image, proximity);
    snapshot.left_wheel = wheel;
    snapshot.right_wheel = wheel;
    snapshot
}
