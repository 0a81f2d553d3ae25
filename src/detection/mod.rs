//! Perception: lane borders from the line camera and obstacle arbitration.

pub mod border;
pub mod obstacle;
pub mod scan;

pub use border::{BorderDetector, BorderReading, BorderSearch};
pub use obstacle::{Avoidance, ObstacleAvoider, ObstacleDetector, ObstacleDetectorWithServo, Sense, Side};
pub use scan::ServoScan;
