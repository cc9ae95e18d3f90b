//! Actuation
//!
//! Translates layout rectangles and swipe tracks into humanized touch
//! events on a [`Device`]. Every tap lands at a random point inside its
//! rectangle and every swipe endpoint is jittered, so no two gestures are
//! pixel-identical.

use crate::config::{ButtonSpec, SwipeTrack};
use crate::device::{Device, DeviceError};
use crate::stealth::Humanizer;

/// Humanized tap/swipe issuer
pub struct Actuator {
    humanizer: Humanizer,
}

impl Default for Actuator {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuator {
    pub fn new() -> Self {
        Self {
            humanizer: Humanizer::new(),
        }
    }

    /// Tap a random point inside the rectangle.
    pub fn tap_in_rect(
        &mut self,
        device: &mut dyn Device,
        rect: &ButtonSpec,
    ) -> Result<(), DeviceError> {
        let (x, y) = self.humanizer.point_in_rect(rect);
        log::trace!("tap in ({}, {}, {}, {}) -> ({x}, {y})", rect.x, rect.y, rect.w, rect.h);
        device.tap(x, y)
    }

    /// Tap inside the rectangle spanned by a match location and its
    /// template size.
    pub fn tap_at_match(
        &mut self,
        device: &mut dyn Device,
        x: i32,
        y: i32,
        w: u32,
        h: u32,
    ) -> Result<(), DeviceError> {
        let rect = ButtonSpec {
            x,
            y,
            w: w as i32,
            h: h as i32,
        };
        self.tap_in_rect(device, &rect)
    }

    /// Swipe along a named track with jittered endpoints and duration.
    pub fn swipe_track(
        &mut self,
        device: &mut dyn Device,
        track: &SwipeTrack,
    ) -> Result<(), DeviceError> {
        let from = (self.humanizer.jitter(track.x1), self.humanizer.jitter(track.y1));
        let to = (self.humanizer.jitter(track.x2), self.humanizer.jitter(track.y2));
        let duration = self.humanizer.swipe_duration_ms();
        device.swipe(from, to, duration)
    }
}
