//! Fuzz target: `RobotConfig::from_json`
//!
//! Invariants checked:
//! - No panics on arbitrary bytes
//! - Anything that parses serialises again, and the integer settings
//!   survive the round trip
//!
//! cargo fuzz run fuzz_robot_config

#![no_main]

use libfuzzer_sys::fuzz_target;
use linebot::config::RobotConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = RobotConfig::from_json(data) else {
        return;
    };
    let json = config.to_json().expect("parsed config must serialise");
    // Gains overflowing f32 serialise as null and do not parse back.
    if let Ok(again) = RobotConfig::from_json(json.as_bytes()) {
        assert_eq!(again.border, config.border);
        assert_eq!(again.obstacle.threshold_distance, config.obstacle.threshold_distance);
        assert_eq!(again.cycle_period_us, config.cycle_period_us);
    }
});
