//! Bot configuration
//!
//! Static configuration loaded once at startup: the button layout (where the
//! game's controls live on screen) and the run profile (which quest to farm,
//! which support servants to accept, how to recover AP).

pub mod buttons;
pub mod profile;

pub use buttons::{ButtonLayout, ButtonSpec, SwipeTrack};
pub use profile::{ApItem, Intervals, Profile, RetryLimits};

/// Configuration errors
///
/// All of these are fatal before a run starts; none are produced mid-battle
/// except [`ConfigError::InvalidCardSet`], which guards the attack
/// precondition.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown button '{0}'")]
    UnknownButton(String),
    #[error("unknown distance '{0}'")]
    UnknownDistance(String),
    #[error("unknown swipe track '{0}'")]
    UnknownTrack(String),
    #[error("stage {stage} is outside [1, {stage_count}]")]
    StageOutOfRange { stage: u32, stage_count: u32 },
    #[error("stage {0} already has a handler")]
    DuplicateStageHandler(u32),
    #[error("no handler registered for stage {0}")]
    MissingStageHandler(u32),
    #[error("invalid card set {cards:?}: {reason}")]
    InvalidCardSet { cards: Vec<u8>, reason: &'static str },
}
