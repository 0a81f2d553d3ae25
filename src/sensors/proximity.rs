//! Optical proximity sensor readings.
//!
//! The sensors are analog: a closer obstacle gives a higher 16-bit value.
//! Sampling itself belongs to the ADC driver, which the core reaches only
//! through [`ProximityInput`].  What arrives in a cycle snapshot is either
//! a [`ProximityPair`] (two fixed sensors) or a [`ProximityBurst`] (several
//! raw reads of the single servo-mounted sensor, averaged by the scanner).

use heapless::Vec;

/// Upper bound on raw reads collected for one scan sample.
pub const MAX_BURST: usize = 16;

/// Pull-based access to a raw analog proximity reading.
pub trait ProximityInput {
    /// Latest raw 16-bit reading.
    fn read_u16(&mut self) -> u16;
}

impl<F: FnMut() -> u16> ProximityInput for F {
    fn read_u16(&mut self) -> u16 {
        self()
    }
}

/// One reading of the two fixed front sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProximityPair {
    pub left: u16,
    pub right: u16,
}

impl ProximityPair {
    /// Sample both sensors once.
    pub fn sample(left: &mut impl ProximityInput, right: &mut impl ProximityInput) -> Self {
        Self {
            left: left.read_u16(),
            right: right.read_u16(),
        }
    }
}

/// Raw reads of the scanning sensor taken within one cycle.
pub type ProximityBurst = Vec<u16, MAX_BURST>;

/// Collect `count` raw reads (at most [`MAX_BURST`]).
pub fn sample_burst(input: &mut impl ProximityInput, count: usize) -> ProximityBurst {
    let mut burst = ProximityBurst::new();
    for _ in 0..count.min(MAX_BURST) {
        // Capacity checked by the loop bound.
        let _ = burst.push(input.read_u16());
    }
    burst
}

/// Integer mean of a burst; 0 when empty.
pub fn average(burst: &[u16]) -> u16 {
    if burst.is_empty() {
        return 0;
    }
    let sum: u32 = burst.iter().map(|&v| u32::from(v)).sum();
    (sum / burst.len() as u32) as u16
}
