//! Test doubles for the perception and actuation boundaries
//!
//! `FakeScreen` replays a scripted sequence of frame states (one per
//! refresh); `RecordingDevice` captures every touch event. Together they
//! let the state-machine tests assert on exact tap coordinates and gesture
//! counts without a device or real images.

use std::collections::HashMap;

use image::DynamicImage;

use crate::config::{ButtonLayout, Intervals, Profile, RetryLimits};
use crate::device::{Device, DeviceError};
use crate::vision::{Screen, VisionError};

/// One touch event seen by the fake device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedTouch {
    Tap { x: i32, y: i32 },
    Swipe {
        from: (i32, i32),
        to: (i32, i32),
        duration_ms: u32,
    },
}

/// Device fake that records instead of actuating
#[derive(Default)]
pub struct RecordingDevice {
    touches: Vec<RecordedTouch>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touches(&self) -> &[RecordedTouch] {
        &self.touches
    }

    pub fn taps(&self) -> Vec<(i32, i32)> {
        self.touches
            .iter()
            .filter_map(|t| match t {
                RecordedTouch::Tap { x, y } => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }

    pub fn swipe_count(&self) -> usize {
        self.touches
            .iter()
            .filter(|t| matches!(t, RecordedTouch::Swipe { .. }))
            .count()
    }
}

impl Device for RecordingDevice {
    fn connected(&self) -> bool {
        true
    }

    fn connect(&mut self, _address: &str) -> Result<(), DeviceError> {
        Ok(())
    }

    fn capture(&mut self) -> Result<DynamicImage, DeviceError> {
        Ok(DynamicImage::new_luma8(1, 1))
    }

    fn tap(&mut self, x: i32, y: i32) -> Result<(), DeviceError> {
        self.touches.push(RecordedTouch::Tap { x, y });
        Ok(())
    }

    fn swipe(
        &mut self,
        from: (i32, i32),
        to: (i32, i32),
        duration_ms: u32,
    ) -> Result<(), DeviceError> {
        self.touches.push(RecordedTouch::Swipe {
            from,
            to,
            duration_ms,
        });
        Ok(())
    }
}

/// One visible template in a scripted frame
#[derive(Debug, Clone, Copy)]
pub struct FakeItem {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    pub prob: f32,
}

impl FakeItem {
    /// Fully-confident unit-size item, so taps on it are coordinate-exact.
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            w: 1,
            h: 1,
            prob: 1.0,
        }
    }

    pub fn with_prob(mut self, prob: f32) -> Self {
        self.prob = prob;
        self
    }
}

/// The set of templates visible on one scripted frame
#[derive(Debug, Clone, Default)]
pub struct FakeFrame {
    items: HashMap<String, FakeItem>,
}

impl FakeFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, item: FakeItem) -> Self {
        self.items.insert(name.to_string(), item);
        self
    }
}

/// Scripted [`Screen`]: each refresh advances to the next frame state
///
/// The first refresh lands on the first scripted frame; once the script is
/// exhausted the last frame persists.
pub struct FakeScreen {
    frames: Vec<FakeFrame>,
    pos: usize,
    started: bool,
    threshold: f32,
}

impl FakeScreen {
    pub fn new(frames: Vec<FakeFrame>) -> Self {
        assert!(!frames.is_empty(), "scripted screen needs at least one frame");
        Self {
            frames,
            pos: 0,
            started: false,
            threshold: 0.97,
        }
    }

    fn current(&self) -> &FakeFrame {
        &self.frames[self.pos]
    }

    fn item(&self, name: &str, threshold: Option<f32>) -> Option<&FakeItem> {
        let floor = threshold.unwrap_or(self.threshold);
        self.current()
            .items
            .get(name)
            .filter(|item| item.prob >= floor)
    }
}

impl Screen for FakeScreen {
    fn refresh(&mut self, _frame: DynamicImage) -> Result<(), VisionError> {
        if self.started {
            if self.pos + 1 < self.frames.len() {
                self.pos += 1;
            }
        } else {
            self.started = true;
        }
        Ok(())
    }

    fn find(&self, name: &str, threshold: Option<f32>) -> Option<(i32, i32)> {
        self.item(name, threshold).map(|item| (item.x, item.y))
    }

    fn probability(&self, name: &str) -> f32 {
        self.current()
            .items
            .get(name)
            .map(|item| item.prob)
            .unwrap_or(0.0)
    }

    fn template_size(&self, name: &str) -> Option<(u32, u32)> {
        self.current().items.get(name).map(|item| (item.w, item.h))
    }
}

/// Layout with unit-size buttons and round distances, so expected tap
/// coordinates can be computed by hand in tests.
pub fn unit_layout() -> ButtonLayout {
    let json = r#"{
        "buttons": {
            "skill":             {"x": 100,  "y": 500, "w": 1, "h": 1},
            "choose_object":     {"x": 200,  "y": 300, "w": 1, "h": 1},
            "master_skill_menu": {"x": 1100, "y": 150, "w": 1, "h": 1},
            "master_skill":      {"x": 900,  "y": 250, "w": 1, "h": 1},
            "change":            {"x": 50,   "y": 280, "w": 1, "h": 1},
            "card":              {"x": 100,  "y": 600, "w": 1, "h": 1},
            "noble_card":        {"x": 400,  "y": 100, "w": 1, "h": 1},
            "screen":            {"x": 640,  "y": 360, "w": 1, "h": 1}
        },
        "distances": {
            "servant": 1000,
            "skill": 100,
            "master_skill": 10,
            "choose_object": 50,
            "change": 7,
            "card": 200
        },
        "swipes": {
            "quest":     {"x1": 10, "y1": 10, "x2": 20, "y2": 20},
            "friend":    {"x1": 30, "y1": 30, "x2": 40, "y2": 40},
            "ap_reveal": {"x1": 50, "y1": 50, "x2": 60, "y2": 60}
        }
    }"#;
    serde_json::from_str(json).expect("unit layout is valid")
}

/// Profile with zero intervals and the given number of roster entries.
pub fn fast_profile(friend_count: usize) -> Profile {
    Profile {
        templates: "templates".into(),
        quest: "quest.png".into(),
        friends: (0..friend_count)
            .map(|i| format!("friend_{i}.png").into())
            .collect(),
        ap: Vec::new(),
        stage_count: 3,
        threshold: 0.95,
        device: None,
        intervals: Intervals::none(),
        retry: RetryLimits::default(),
    }
}
