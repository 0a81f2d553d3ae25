//! Lane-border detector for the line camera.
//!
//! The track is a light surface framed by two dark-on-light (after the
//! camera's inversion: bright) lane lines.  Each cycle the detector looks
//! for the brightest sample on either side of the image and reports the
//! two positions plus a signed steering error.
//!
//! Borders persist between cycles.  A small neighbourhood around the last
//! known border is searched first; only a side that is not found there
//! falls back to scanning its whole half of the image.  When nothing
//! above the threshold is visible a side keeps its default (0 or N), which
//! for both sides yields an error of 0, so the robot drives straight on.

use log::debug;

use crate::config::{BorderConfig, CAMERA_IMAGE_SIZE};
use crate::image::{argmax, LineImage};

/// How the borders of the last cycle were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderSearch {
    /// Both borders were confirmed in the neighbourhood of the previous ones.
    Tracked,
    /// At least one side needed a search over its whole half.
    Searched,
}

/// Border positions and the error derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BorderReading {
    pub left: i32,
    pub right: i32,
    pub error: i32,
}

/// Detector for the two lane borders in a `N`-pixel image.
#[derive(Debug, Clone)]
pub struct BorderDetector<const N: usize = CAMERA_IMAGE_SIZE> {
    config: BorderConfig,
    left: usize,
    right: usize,
    threshold: u16,
}

impl<const N: usize> BorderDetector<N> {
    /// Image column treated as straight ahead.
    pub const CENTER: i32 = (N / 2) as i32;

    pub fn new(config: BorderConfig) -> Self {
        Self {
            config,
            left: 0,
            right: N,
            threshold: 0,
        }
    }

    /// Calibrate the threshold from an image with well visible lanes.
    ///
    /// The threshold becomes `percent_coefficient` % of the brightest pixel,
    /// ignoring `edge_offset` pixels at either end of the sensor.
    pub fn initialize(&mut self, image: &LineImage<N>, percent_coefficient: u8) {
        let max = u32::from(self.max_value(image));
        // Above 100 % the threshold saturates instead of wrapping.
        self.threshold =
            u16::try_from(max * u32::from(percent_coefficient) / 100).unwrap_or(u16::MAX);
        debug!(
            "border threshold calibrated: {} ({}% of {})",
            self.threshold, percent_coefficient, max
        );
    }

    /// Locate both borders in `image` and store them for the next cycle.
    pub fn find_border(&mut self, image: &LineImage<N>) -> BorderSearch {
        let previous_left = self.left;
        let previous_right = self.right;
        let middle = (previous_left + previous_right) / 2;
        self.left = 0;
        self.right = N;

        let around_left = self.around_previous(image, previous_left);
        let around_right = self.around_previous(image, previous_right);
        if let Some(i) = around_left {
            self.left = i;
        }
        if let Some(i) = around_right {
            self.right = i;
        }

        if around_left.is_some() && around_right.is_some() {
            return BorderSearch::Tracked;
        }

        if around_left.is_none() {
            if let Some((i, v)) = argmax(&image[..middle]) {
                if v > self.threshold {
                    self.left = i;
                }
            }
        }

        if around_right.is_none() {
            if let Some((i, v)) = argmax(&image[middle..]) {
                if v > self.threshold {
                    self.right = middle + i;
                }
            }
        }

        if previous_left != 0 && self.left == 0 {
            debug!("left border lost (was {previous_left})");
        }
        if previous_right != N && self.right == N {
            debug!("right border lost (was {previous_right})");
        }

        BorderSearch::Searched
    }

    /// Distance of the left border from the image centre.
    pub fn left_distance_from_center(&self) -> i32 {
        Self::CENTER - self.left as i32
    }

    /// Distance of the right border from the image centre.
    pub fn right_distance_from_center(&self) -> i32 {
        self.right as i32 - Self::CENTER
    }

    /// Steering error from the last [`find_border`](Self::find_border).
    ///
    /// Positive when the left line is closer to the centre than the right
    /// one, negative in the opposite case.  `percent_coefficient` scales
    /// the halved raw error.
    pub fn error(&self, percent_coefficient: i32) -> i32 {
        let raw = (self.right_distance_from_center() - self.left_distance_from_center()) / 2;
        raw.saturating_mul(percent_coefficient) / 100
    }

    /// Borders and error using the configured error percentage.
    pub fn reading(&self) -> BorderReading {
        BorderReading {
            left: self.left as i32,
            right: self.right as i32,
            error: self.error(self.config.error_percent),
        }
    }

    /// Position of the left border (0 ..= N).
    pub fn left_border(&self) -> usize {
        self.left
    }

    /// Position of the right border (0 ..= N).
    pub fn right_border(&self) -> usize {
        self.right
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    pub fn config(&self) -> BorderConfig {
        self.config
    }

    /// Replace the configuration and forget the tracked borders.
    ///
    /// The calibrated threshold is kept: it depends on the lighting, not on
    /// the search parameters.
    pub fn set_config(&mut self, config: BorderConfig) {
        self.config = config;
        self.reset();
    }

    /// Forget the tracked borders; the next cycle searches the full width.
    pub fn reset(&mut self) {
        self.left = 0;
        self.right = N;
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// Brightest value between the edge offsets.
    ///
    /// The running maximum starts at pixel 0, so that pixel still takes
    /// part even though it lies inside the ignored edge.
    fn max_value(&self, image: &LineImage<N>) -> u16 {
        if N == 0 {
            return 0;
        }
        let offset = self.config.edge_offset;
        let mut at = 0;
        for i in offset..N.saturating_sub(offset) {
            if image[i] > image[at] {
                at = i;
            }
        }
        image[at]
    }

    /// Brightest pixel above the threshold within the neighbourhood of
    /// `previous`, clamped to the image.
    fn around_previous(&self, image: &LineImage<N>, previous: usize) -> Option<usize> {
        let last = N.checked_sub(1)?;
        let radius = self.config.neighborhood;
        let start = previous.saturating_sub(radius).min(last);
        let end = previous.saturating_add(radius).min(last);

        let mut max = self.threshold;
        let mut found = None;
        for (i, &v) in image.iter().enumerate().take(end + 1).skip(start) {
            if v > max {
                max = v;
                found = Some(i);
            }
        }
        found
    }
}

impl<const N: usize> Default for BorderDetector<N> {
    fn default() -> Self {
        Self::new(BorderConfig::default())
    }
}
