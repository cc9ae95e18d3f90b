//! Button layout
//!
//! Maps named UI controls to screen rectangles, plus the per-unit repeat
//! distances used to address repeated controls (skill slots, command cards)
//! and the named swipe tracks for scrollable lists.
//!
//! The layout is loaded once from JSON and never mutated afterwards. All
//! coordinates are in device pixels; the defaults are calibrated for a
//! 1280x720 screen.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Pixel rectangle of one named control
///
/// `(x, y)` is the top-left corner; taps land at a random point inside the
/// rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSpec {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl ButtonSpec {
    /// The same rectangle shifted horizontally by `dx` pixels.
    ///
    /// Repeated controls (skill slots, cards, order-change targets) are laid
    /// out on a horizontal rail, so index arithmetic only ever moves x.
    pub fn shifted(&self, dx: i32) -> ButtonSpec {
        ButtonSpec {
            x: self.x + dx,
            ..*self
        }
    }
}

/// Endpoints of one named swipe gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeTrack {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// Static mapping from control names to rectangles, distances and tracks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonLayout {
    buttons: HashMap<String, ButtonSpec>,
    distances: HashMap<String, i32>,
    swipes: HashMap<String, SwipeTrack>,
}

impl ButtonLayout {
    /// Load a layout from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Look up a control rectangle by name.
    pub fn button(&self, name: &str) -> Result<ButtonSpec, ConfigError> {
        self.buttons
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownButton(name.to_string()))
    }

    /// Look up a per-unit repeat distance by name.
    pub fn distance(&self, name: &str) -> Result<i32, ConfigError> {
        self.distances
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownDistance(name.to_string()))
    }

    /// Look up a swipe track by name.
    pub fn track(&self, name: &str) -> Result<SwipeTrack, ConfigError> {
        self.swipes
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownTrack(name.to_string()))
    }
}

impl Default for ButtonLayout {
    /// Layout for the stock 1280x720 rendering of the battle UI.
    fn default() -> Self {
        let buttons = [
            // First servant's first skill slot; other slots are reached via
            // the servant/skill distances.
            ("skill", ButtonSpec { x: 40, y: 540, w: 78, h: 78 }),
            // Leftmost slot of the target-selection prompt.
            ("choose_object", ButtonSpec { x: 242, y: 280, w: 156, h: 156 }),
            ("master_skill_menu", ButtonSpec { x: 1184, y: 240, w: 56, h: 56 }),
            ("master_skill", ButtonSpec { x: 944, y: 250, w: 60, h: 60 }),
            // Leftmost portrait of the order-change prompt.
            ("change", ButtonSpec { x: 96, y: 276, w: 140, h: 166 }),
            // Leftmost normal command card.
            ("card", ButtonSpec { x: 40, y: 420, w: 175, h: 250 }),
            // Leftmost noble phantasm card.
            ("noble_card", ButtonSpec { x: 300, y: 120, w: 150, h: 190 }),
            // Neutral spot tapped to skip result screens.
            ("screen", ButtonSpec { x: 640, y: 360, w: 50, h: 50 }),
        ]
        .into_iter()
        .map(|(name, spec)| (name.to_string(), spec))
        .collect();

        let distances = [
            ("servant", 317),
            ("skill", 106),
            ("master_skill", 120),
            ("choose_object", 256),
            ("change", 212),
            ("card", 256),
        ]
        .into_iter()
        .map(|(name, d)| (name.to_string(), d))
        .collect();

        let swipes = [
            ("quest", SwipeTrack { x1: 640, y1: 500, x2: 640, y2: 300 }),
            ("friend", SwipeTrack { x1: 640, y1: 560, x2: 640, y2: 360 }),
            // Scrolls the AP recovery dialog to reveal lower item tiers.
            ("ap_reveal", SwipeTrack { x1: 640, y1: 400, x2: 640, y2: 250 }),
        ]
        .into_iter()
        .map(|(name, t)| (name.to_string(), t))
        .collect();

        Self {
            buttons,
            distances,
            swipes,
        }
    }
}
