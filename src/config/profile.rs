//! Run profile
//!
//! Everything that varies between farming runs: which quest banner to tap,
//! which support servants are acceptable, how to recover AP, how many stages
//! a battle has, and the timing/retry discipline of the polling loops.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// One AP recovery item, tried in strategy order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApItem {
    /// Template name of the item row in the recovery dialog.
    pub name: String,
    /// Whether the dialog must be scrolled before the item becomes visible.
    #[serde(default)]
    pub reveal: bool,
}

impl ApItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reveal: false,
        }
    }

    /// Mark this item as hidden below the fold of the recovery dialog.
    pub fn revealed_by_scroll(mut self) -> Self {
        self.reveal = true;
        self
    }
}

/// Pause lengths between perception/actuation steps
///
/// Short covers UI settling after a tap, medium covers a battle loading
/// screen, long covers a full round of attack animations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Intervals {
    pub short_ms: u64,
    pub medium_ms: u64,
    pub long_ms: u64,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            short_ms: 1_000,
            medium_ms: 10_000,
            long_ms: 25_000,
        }
    }
}

impl Intervals {
    pub fn short(&self) -> Duration {
        Duration::from_millis(self.short_ms)
    }

    pub fn medium(&self) -> Duration {
        Duration::from_millis(self.medium_ms)
    }

    pub fn long(&self) -> Duration {
        Duration::from_millis(self.long_ms)
    }

    /// Zero-length intervals, used by tests to run the loops at full speed.
    pub fn none() -> Self {
        Self {
            short_ms: 0,
            medium_ms: 0,
            long_ms: 0,
        }
    }
}

/// Attempt ceilings for the polling loops
///
/// Every poll-until-visible loop in the engine is bounded by one of these;
/// exhausting a ceiling surfaces a timeout instead of spinning forever.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryLimits {
    /// Polls of a single wait-until-visible loop.
    pub wait_visible: u32,
    /// Find-and-tap attempts on the quest banner or continue prompt.
    pub entry_taps: u32,
    /// Poll-swipe cycles of one pass over the support list.
    pub friend_polls: u32,
    /// Support list refreshes before giving up on friend selection.
    pub friend_refreshes: u32,
    /// Screen taps while waiting for the battle result screen.
    pub end_taps: u32,
}

impl Default for RetryLimits {
    fn default() -> Self {
        Self {
            wait_visible: 300,
            entry_taps: 30,
            friend_polls: 6,
            friend_refreshes: 10,
            end_taps: 120,
        }
    }
}

/// Complete per-run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Directory holding the standard UI landmark templates
    /// (`menu.png`, `attack.png`, ...).
    #[serde(default = "default_templates_dir")]
    pub templates: PathBuf,
    /// Reference image of the quest banner to farm.
    pub quest: PathBuf,
    /// Reference images of acceptable support servants, in preference order.
    pub friends: Vec<PathBuf>,
    /// AP recovery strategy; empty means abort rather than spend items.
    #[serde(default)]
    pub ap: Vec<ApItem>,
    /// Number of stages in the target battle.
    pub stage_count: u32,
    /// Default template-match confidence floor in (0, 1].
    pub threshold: f32,
    /// adb address to connect when the device is not already attached.
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub intervals: Intervals,
    #[serde(default)]
    pub retry: RetryLimits,
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            templates: default_templates_dir(),
            quest: PathBuf::from("quest.png"),
            friends: vec![PathBuf::from("friend.png")],
            ap: Vec::new(),
            stage_count: 3,
            threshold: 0.97,
            device: None,
            intervals: Intervals::default(),
            retry: RetryLimits::default(),
        }
    }
}

impl Profile {
    /// Load a profile from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
