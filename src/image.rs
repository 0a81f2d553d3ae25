//! One-dimensional brightness images.
//!
//! The line camera delivers `N` unsigned samples per exposure; the servo
//! scanner builds an image of the same shape out of proximity readings.
//! Both are plain arrays so they can be copied into a snapshot without
//! touching the heap.

use crate::config::CAMERA_IMAGE_SIZE;

/// A fixed-length line of brightness samples.
pub type LineImage<const N: usize = CAMERA_IMAGE_SIZE> = [u16; N];

/// Index and value of the brightest sample in `data`.
///
/// Ties resolve to the first occurrence.  Returns `None` for an empty slice.
pub fn argmax(data: &[u16]) -> Option<(usize, u16)> {
    let mut best: Option<(usize, u16)> = None;
    for (i, &v) in data.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best
}

/// Absolute difference between neighbouring pixels; the first pixel is 0.
///
/// Turns a brightness profile into an edge-strength profile.
pub fn difference<const N: usize>(image: &LineImage<N>) -> LineImage<N> {
    let mut out = [0u16; N];
    for i in 1..N {
        out[i] = image[i].abs_diff(image[i - 1]);
    }
    out
}
