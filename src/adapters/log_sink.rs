//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (serial console on the robot, `env_logger` in the
//! simulator).  A Bluetooth telemetry adapter would implement the same
//! trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | #{} | borders={}..{} err={} steer={}\u{00b0} | \
                     {:?} | v={:.2}/{:.2} target={:.2} m/s | power={}/{} | d={:.2} m",
                    t.cycle,
                    t.left_border,
                    t.right_border,
                    t.steering_error,
                    t.steering_angle,
                    t.avoidance,
                    t.left_speed,
                    t.right_speed,
                    t.desired_speed,
                    t.left_power,
                    t.right_power,
                    t.distance,
                );
            }
            AppEvent::AvoidanceChanged { from, to } => {
                info!("AVOID | {:?} -> {:?}", from, to);
            }
            AppEvent::LaneLost => {
                warn!("LANE  | lost");
            }
            AppEvent::LaneFound => {
                info!("LANE  | found");
            }
            AppEvent::Calibrated { threshold } => {
                info!("CALIB | threshold={}", threshold);
            }
            AppEvent::ConfigReplaced => {
                info!("CONF  | replaced");
            }
            AppEvent::Started => {
                info!("START");
            }
        }
    }
}
