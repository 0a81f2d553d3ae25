//! Fuzz target: `BorderDetector` over a sequence of camera images
//!
//! The first byte picks the threshold percentage and the neighbourhood
//! radius; the rest is cut into 128-pixel images fed cycle after cycle.
//!
//! Invariants checked:
//! - No panics for any image content or configuration
//! - Both borders stay within `0..=N`
//! - A lost side reports its default (0 or N)
//!
//! cargo fuzz run fuzz_border_detector

#![no_main]

use libfuzzer_sys::fuzz_target;
use linebot::config::BorderConfig;
use linebot::detection::BorderDetector;

const N: usize = 128;

fuzz_target!(|data: &[u8]| {
    let Some((&knobs, rest)) = data.split_first() else {
        return;
    };

    let config = BorderConfig {
        neighborhood: usize::from(knobs >> 4),
        edge_offset: usize::from(knobs & 0x0f),
        ..BorderConfig::default()
    };
    let mut det = BorderDetector::<N>::new(config);

    for (cycle, chunk) in rest.chunks_exact(N * 2).enumerate() {
        let mut image = [0u16; N];
        for (px, pair) in image.iter_mut().zip(chunk.chunks_exact(2)) {
            *px = u16::from_le_bytes([pair[0], pair[1]]);
        }

        if cycle == 0 {
            det.initialize(&image, knobs % 101);
        }
        det.find_border(&image);

        assert!(det.left_border() <= N);
        assert!(det.right_border() <= N);
        let reading = det.reading();
        assert_eq!(reading.left, det.left_border() as i32);
        assert_eq!(reading.right, det.right_border() as i32);
    }
});
