//! Randomized touch variance
//!
//! Taps land at a uniformly random point inside the target rectangle; swipe
//! endpoints and durations wobble a few pixels/milliseconds per gesture.

use rand::Rng;

use crate::config::ButtonSpec;

/// Pixel wobble applied to each swipe endpoint coordinate
const SWIPE_JITTER_PX: i32 = 5;

/// Swipe duration range in milliseconds
const MIN_SWIPE_DURATION_MS: u32 = 250;
const MAX_SWIPE_DURATION_MS: u32 = 350;

/// Source of the per-gesture randomness
pub struct Humanizer {
    rng: rand::rngs::ThreadRng,
}

impl Default for Humanizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Humanizer {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// A uniformly random point inside the rectangle.
    ///
    /// Degenerate rectangles (w or h <= 1) collapse to their corner, which
    /// is what coordinate-exactness tests rely on.
    pub fn point_in_rect(&mut self, rect: &ButtonSpec) -> (i32, i32) {
        let x = if rect.w > 1 {
            rect.x + self.rng.gen_range(0..rect.w)
        } else {
            rect.x
        };
        let y = if rect.h > 1 {
            rect.y + self.rng.gen_range(0..rect.h)
        } else {
            rect.y
        };
        (x, y)
    }

    /// Wobble a single swipe endpoint coordinate.
    pub fn jitter(&mut self, coord: i32) -> i32 {
        coord + self.rng.gen_range(-SWIPE_JITTER_PX..=SWIPE_JITTER_PX)
    }

    /// A plausible swipe duration.
    pub fn swipe_duration_ms(&mut self) -> u32 {
        self.rng
            .gen_range(MIN_SWIPE_DURATION_MS..=MAX_SWIPE_DURATION_MS)
    }
}
