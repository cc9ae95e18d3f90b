//! FGO Mashu - screen-driven Fate/Grand Order battle automation
//!
//! This library farms a fixed quest unattended: it perceives the game
//! purely through template matching on captured frames and acts purely
//! through synthetic taps and swipes, repeating enter-battle / play-stages /
//! end-battle cycles until a loop bound is reached or AP runs out.
//!
//! The engine never talks to the game server and holds no game state beyond
//! what is visible on screen. Perception goes through the [`Screen`] trait,
//! actuation through the [`Device`] trait, so both can be faked in tests.
//!
//! ## Wiring
//!
//! ```no_run
//! use fgo_mashu::{build_oracle, AdbDevice, BattleBot, BattleRunner, ButtonLayout, Profile};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let profile = Profile::default();
//! let oracle = build_oracle(&profile)?;
//! let device = AdbDevice::new();
//! let bot = BattleBot::new(device, oracle, ButtonLayout::default(), profile);
//! let mut runner = BattleRunner::new(bot);
//!
//! runner.at_stage(1, |bot| {
//!     bot.use_skill(2, 2, None)?;
//!     bot.attack(&[6, 1, 2])
//! })?;
//! runner.at_stage(2, |bot| bot.attack(&[6, 1, 2]))?;
//! runner.at_stage(3, |bot| bot.attack(&[6, 1, 2]))?;
//!
//! let summary = runner.run(3)?;
//! println!("{} battles completed", summary.battles);
//! # Ok(())
//! # }
//! ```

pub mod battle;
pub mod config;
pub mod device;
pub mod input;
pub mod runner;
pub mod stealth;
pub mod vision;

#[cfg(test)]
pub(crate) mod fixtures;

pub use battle::{ActionOutcome, BattleBot, BotError, EnterOutcome, SkipReason};
pub use config::{ApItem, ButtonLayout, ConfigError, Profile};
pub use device::{AdbDevice, Device, DeviceError};
pub use input::Actuator;
pub use runner::{BattleRunner, RunSummary};
pub use vision::{Screen, ScreenOracle, VisionError};

/// Build a [`ScreenOracle`] loaded with everything a run needs: the
/// standard UI landmarks from the profile's template directory, the quest
/// banner, and one `friend_<i>` template per roster entry.
pub fn build_oracle(profile: &Profile) -> Result<ScreenOracle, VisionError> {
    let mut oracle = ScreenOracle::new(profile.threshold);
    for name in battle::LANDMARKS {
        let path = profile.templates.join(format!("{name}.png"));
        oracle.load_template(path, *name)?;
    }
    oracle.load_template(&profile.quest, "quest")?;
    for (i, path) in profile.friends.iter().enumerate() {
        oracle.load_template(path, format!("friend_{i}"))?;
    }
    Ok(oracle)
}
