//! Battle engine
//!
//! The perception-action state machine that enters a battle, selects a
//! support servant, recovers AP when it runs out, executes the per-stage
//! scripts, and closes out the result screens. Perception and actuation are
//! strictly interleaved on one thread: no tap is issued without a preceding
//! query confirming the expected UI state, and the only suspension points
//! are the timed waits between polls.

pub mod registry;

use std::thread;
use std::time::Duration;

use crate::config::{ButtonLayout, ButtonSpec, ConfigError, Profile};
use crate::device::{Device, DeviceError};
use crate::input::Actuator;
use crate::vision::{Screen, VisionError};

// Standard UI landmark templates the engine queries by name. The quest
// banner and support portraits come from the profile instead.
const MENU: &str = "menu";
const ATTACK: &str = "attack";
const RECONNECT: &str = "reconnect";
const QUEST: &str = "quest";
const AP_REGEN: &str = "ap_regen";
const DECIDE: &str = "decide";
const REFRESH_FRIENDS: &str = "refresh_friends";
const YES: &str = "yes";
const START_QUEST: &str = "start_quest";
const CONTINUE: &str = "cont";
const NEXT_STEP: &str = "next_step";
const NOT_APPLY: &str = "not_apply";
const CHOOSE_OBJECT: &str = "choose_object";
const ORDER_CHANGE: &str = "order_change";
const CHANGE: &str = "change";

/// Landmark templates every oracle must carry, as `<name>.png` files in the
/// profile's template directory.
pub const LANDMARKS: &[&str] = &[
    MENU,
    ATTACK,
    RECONNECT,
    AP_REGEN,
    DECIDE,
    REFRESH_FRIENDS,
    YES,
    START_QUEST,
    CONTINUE,
    NEXT_STEP,
    NOT_APPLY,
    CHOOSE_OBJECT,
    ORDER_CHANGE,
    CHANGE,
];

/// Battle engine errors
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    #[error("perception error: {0}")]
    Vision(#[from] VisionError),
    #[error("timed out waiting for '{target}' after {attempts} attempts")]
    Timeout { target: String, attempts: u32 },
}

/// Result of trying to enter or re-enter a battle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterOutcome {
    /// The battle is loading.
    Entered,
    /// AP ran out and the recovery strategy could not restore it.
    ApExhausted,
}

/// Why a skill's target selection was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A target prompt appeared but no object was supplied.
    MissingObject,
    /// The supplied object is outside the prompt's valid range.
    InvalidObject,
}

/// Result of an action invoker that tolerates bad target selections
///
/// A skipped action completed its taps except for the unresolved target
/// selection; it is deliberately not an error so scripts keep running, but
/// callers can observe the skip instead of scraping logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    Skipped(SkipReason),
}

/// Which target prompt appeared after a master skill tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    None,
    SingleObject,
    OrderChange,
}

/// The battle state machine
///
/// Owns the device channel, the screen oracle, and the actuator; stage
/// scripts receive `&mut BattleBot` and drive the action invokers.
pub struct BattleBot<D: Device, S: Screen> {
    device: D,
    screen: S,
    actuator: Actuator,
    layout: ButtonLayout,
    profile: Profile,
    friend_names: Vec<String>,
}

impl<D: Device, S: Screen> BattleBot<D, S> {
    /// Assemble the engine. The screen must already hold the quest template
    /// (as `quest`), one `friend_<i>` template per roster entry, and the
    /// standard [`LANDMARKS`].
    pub fn new(device: D, screen: S, layout: ButtonLayout, profile: Profile) -> Self {
        let friend_names = (0..profile.friends.len())
            .map(|i| format!("friend_{i}"))
            .collect();
        log::info!(
            "bot ready: {} stages, {} roster entries, {} AP items",
            profile.stage_count,
            profile.friends.len(),
            profile.ap.len()
        );
        Self {
            device,
            screen,
            actuator: Actuator::new(),
            layout,
            profile,
            friend_names,
        }
    }

    pub fn stage_count(&self) -> u32 {
        self.profile.stage_count
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    // ---- perception/actuation glue ----

    fn refresh(&mut self) -> Result<(), BotError> {
        let frame = self.device.capture()?;
        self.screen.refresh(frame)?;
        Ok(())
    }

    /// Sleep, then refresh the cached frame.
    fn wait(&mut self, duration: Duration) -> Result<(), BotError> {
        if !duration.is_zero() {
            log::trace!("sleeping {duration:?}");
            thread::sleep(duration);
        }
        self.refresh()
    }

    fn pause_short(&mut self) -> Result<(), BotError> {
        let d = self.profile.intervals.short();
        self.wait(d)
    }

    pub(crate) fn pause_long(&mut self) -> Result<(), BotError> {
        let d = self.profile.intervals.long();
        self.wait(d)
    }

    /// Find a template on the cached frame and tap inside its match
    /// rectangle. A miss is not an error, just `false`.
    fn find_and_tap(&mut self, name: &str, threshold: Option<f32>) -> Result<bool, BotError> {
        let Some((x, y)) = self.screen.find(name, threshold) else {
            log::debug!("'{name}' not on screen");
            return Ok(false);
        };
        let (w, h) = self.screen.template_size(name).unwrap_or((1, 1));
        self.actuator.tap_at_match(&mut self.device, x, y, w, h)?;
        Ok(true)
    }

    fn tap_button(&mut self, rect: &ButtonSpec) -> Result<(), BotError> {
        self.actuator.tap_in_rect(&mut self.device, rect)?;
        Ok(())
    }

    fn swipe(&mut self, track_name: &str) -> Result<(), BotError> {
        let track = self.layout.track(track_name)?;
        self.actuator.swipe_track(&mut self.device, &track)?;
        Ok(())
    }

    /// Poll until the named template is visible, tapping reconnect prompts
    /// between polls. Bounded by `retry.wait_visible`.
    fn wait_visible(&mut self, name: &str) -> Result<(), BotError> {
        log::debug!("waiting for '{name}'");
        self.refresh()?;
        let limit = self.profile.retry.wait_visible;
        for _ in 0..limit {
            if self.screen.exists(name, None) {
                return Ok(());
            }
            self.pause_short()?;
            if self.screen.exists(RECONNECT, None) {
                log::info!("reconnect prompt detected");
                self.find_and_tap(RECONNECT, None)?;
            }
        }
        Err(BotError::Timeout {
            target: name.to_string(),
            attempts: limit,
        })
    }

    // ---- action invokers ----

    /// Block until the attack control is visible — the universal
    /// synchronization point before any player action.
    pub fn wait_until_attack(&mut self) -> Result<(), BotError> {
        self.wait_visible(ATTACK)
    }

    /// Use a servant skill, optionally choosing a target object.
    pub fn use_skill(
        &mut self,
        servant: u8,
        skill: u8,
        object: Option<u8>,
    ) -> Result<ActionOutcome, BotError> {
        self.wait_visible(ATTACK)?;

        let offset = self.layout.distance("servant")? * (servant as i32 - 1)
            + self.layout.distance("skill")? * (skill as i32 - 1);
        let rect = self.layout.button("skill")?.shifted(offset);
        self.tap_button(&rect)?;
        log::debug!("used skill ({servant}, {skill})");
        self.pause_short()?;

        let mut outcome = ActionOutcome::Applied;
        if self.screen.exists(CHOOSE_OBJECT, None) {
            match object {
                None => {
                    log::error!("skill ({servant}, {skill}) requires an object");
                    outcome = ActionOutcome::Skipped(SkipReason::MissingObject);
                }
                Some(obj) => {
                    let offset = self.layout.distance("choose_object")? * (obj as i32 - 1);
                    let rect = self.layout.button("choose_object")?.shifted(offset);
                    self.tap_button(&rect)?;
                    log::debug!("chose skill object {obj}");
                }
            }
        }
        self.pause_short()?;
        Ok(outcome)
    }

    /// Use a master skill. `object` is needed when the skill targets one
    /// servant; `object` and `object2` when it is an order change.
    pub fn use_master_skill(
        &mut self,
        skill: u8,
        object: Option<u8>,
        object2: Option<u8>,
    ) -> Result<ActionOutcome, BotError> {
        self.wait_visible(ATTACK)?;

        self.tap_button(&self.layout.button("master_skill_menu")?)?;
        self.pause_short()?;

        let offset = self.layout.distance("master_skill")? * (skill as i32 - 1);
        let rect = self.layout.button("master_skill")?.shifted(offset);
        self.tap_button(&rect)?;
        log::debug!("used master skill {skill}");
        self.pause_short()?;

        let outcome = match self.master_prompt() {
            PromptKind::None => ActionOutcome::Applied,
            PromptKind::SingleObject => self.choose_master_object(object)?,
            PromptKind::OrderChange => self.order_change(object, object2)?,
        };
        self.pause_short()?;
        Ok(outcome)
    }

    /// The two prompts are mutually exclusive; query both once, then
    /// dispatch.
    fn master_prompt(&self) -> PromptKind {
        if self.screen.exists(CHOOSE_OBJECT, None) {
            PromptKind::SingleObject
        } else if self.screen.exists(ORDER_CHANGE, None) {
            PromptKind::OrderChange
        } else {
            PromptKind::None
        }
    }

    fn choose_master_object(&mut self, object: Option<u8>) -> Result<ActionOutcome, BotError> {
        let Some(obj) = object else {
            log::error!("master skill requires an object");
            return Ok(ActionOutcome::Skipped(SkipReason::MissingObject));
        };
        if !(1..=3).contains(&obj) {
            log::error!("invalid master skill object {obj}");
            return Ok(ActionOutcome::Skipped(SkipReason::InvalidObject));
        }
        let offset = self.layout.distance("choose_object")? * (obj as i32 - 1);
        let rect = self.layout.button("choose_object")?.shifted(offset);
        self.tap_button(&rect)?;
        log::debug!("chose master skill object {obj}");
        Ok(ActionOutcome::Applied)
    }

    fn order_change(
        &mut self,
        object: Option<u8>,
        object2: Option<u8>,
    ) -> Result<ActionOutcome, BotError> {
        let (Some(obj), Some(obj2)) = (object, object2) else {
            log::error!("order change requires two objects");
            return Ok(ActionOutcome::Skipped(SkipReason::MissingObject));
        };
        if !(1..=3).contains(&obj) || !(4..=6).contains(&obj2) {
            log::error!("invalid order change objects ({obj}, {obj2})");
            return Ok(ActionOutcome::Skipped(SkipReason::InvalidObject));
        }

        let distance = self.layout.distance("change")?;
        let first = self
            .layout
            .button("change")?
            .shifted(distance * (obj as i32 - 1));
        self.tap_button(&first)?;
        // The second slot is addressed relative to the first tap's
        // rectangle, not as an independent lookup.
        let second = first.shifted(distance * (obj2 as i32 - obj as i32));
        self.tap_button(&second)?;
        log::debug!("chose order change objects ({obj}, {obj2})");

        self.find_and_tap(CHANGE, None)?;
        log::debug!("order change confirmed");
        Ok(ActionOutcome::Applied)
    }

    /// Tap the attack control and pick three command cards.
    ///
    /// Cards 1-5 address the normal card row, 6-8 the noble phantasm row.
    /// The card set must be exactly 3 distinct values in [1, 8]; anything
    /// else is a hard precondition violation and no taps are issued.
    pub fn attack(&mut self, cards: &[u8]) -> Result<(), BotError> {
        validate_cards(cards)?;
        self.wait_visible(ATTACK)?;
        self.find_and_tap(ATTACK, None)?;
        self.wait(self.profile.intervals.short() * 2)?;

        let card_distance = self.layout.distance("card")?;
        for &card in cards {
            let rect = if card <= 5 {
                self.layout
                    .button("card")?
                    .shifted(card_distance * (card as i32 - 1))
            } else {
                self.layout
                    .button("noble_card")?
                    .shifted(card_distance * (card as i32 - 6))
            };
            self.tap_button(&rect)?;
        }
        log::debug!("attacked with {cards:?}");
        Ok(())
    }

    // ---- battle entry/exit ----

    /// Enter the first battle from the main menu.
    pub fn enter(&mut self) -> Result<EnterOutcome, BotError> {
        log::info!("trying to enter the battle");
        self.wait_visible(MENU)?;

        let limit = self.profile.retry.entry_taps;
        let threshold = self.profile.threshold;
        let mut tapped = false;
        for _ in 0..limit {
            if self.find_and_tap(QUEST, Some(threshold))? {
                tapped = true;
                break;
            }
            self.swipe("quest")?;
            self.pause_short()?;
        }
        if !tapped {
            return Err(BotError::Timeout {
                target: QUEST.to_string(),
                attempts: limit,
            });
        }
        self.pause_short()?;

        if !self.recover_ap_if_needed()? {
            return Ok(EnterOutcome::ApExhausted);
        }

        let friend = self.select_friend()?;
        self.find_and_tap(&friend, Some(threshold))?;
        self.wait_visible(START_QUEST)?;
        self.find_and_tap(START_QUEST, None)?;
        self.wait(self.profile.intervals.medium())?;
        Ok(EnterOutcome::Entered)
    }

    /// Enter the next battle through the continue prompt the game offers
    /// after a result screen. Same AP/support logic as [`BattleBot::enter`],
    /// but no quest selection and no start confirmation.
    pub fn reenter(&mut self) -> Result<EnterOutcome, BotError> {
        log::info!("trying to re-enter the battle");

        let limit = self.profile.retry.entry_taps;
        let mut tapped = false;
        for _ in 0..limit {
            if self.find_and_tap(CONTINUE, None)? {
                tapped = true;
                break;
            }
            self.pause_short()?;
        }
        if !tapped {
            return Err(BotError::Timeout {
                target: CONTINUE.to_string(),
                attempts: limit,
            });
        }
        self.pause_short()?;

        if !self.recover_ap_if_needed()? {
            return Ok(EnterOutcome::ApExhausted);
        }

        let friend = self.select_friend()?;
        let threshold = self.profile.threshold;
        self.find_and_tap(&friend, Some(threshold))?;
        self.wait(self.profile.intervals.medium())?;
        Ok(EnterOutcome::Entered)
    }

    /// Close out the result screens after the last stage.
    pub fn end_battle(&mut self) -> Result<(), BotError> {
        self.pause_short()?;
        log::info!("finishing the battle");

        let limit = self.profile.retry.end_taps;
        let screen_rect = self.layout.button("screen")?;
        let mut seen = false;
        for _ in 0..limit {
            if self.screen.exists(NEXT_STEP, None) {
                seen = true;
                break;
            }
            self.tap_button(&screen_rect)?;
            self.pause_short()?;
            if self.screen.exists(RECONNECT, None) {
                log::info!("reconnect prompt detected");
                self.find_and_tap(RECONNECT, None)?;
            }
        }
        if !seen {
            return Err(BotError::Timeout {
                target: NEXT_STEP.to_string(),
                attempts: limit,
            });
        }

        self.find_and_tap(NEXT_STEP, None)?;
        self.wait(self.profile.intervals.short() * 2)?;
        if self.screen.exists(NEXT_STEP, None) {
            self.find_and_tap(NEXT_STEP, None)?;
            self.pause_short()?;
        }

        // decline the friend request prompt if it comes up
        self.wait(self.profile.intervals.short() * 2)?;
        if self.screen.exists(NOT_APPLY, None) {
            self.find_and_tap(NOT_APPLY, None)?;
        }
        self.pause_short()?;
        Ok(())
    }

    // ---- sub-procedures ----

    /// Returns false when AP is empty and the strategy cannot restore it.
    fn recover_ap_if_needed(&mut self) -> Result<bool, BotError> {
        if !self.screen.exists(AP_REGEN, None) {
            return Ok(true);
        }
        log::info!("insufficient AP");
        if self.profile.ap.is_empty() {
            log::warn!("no AP recovery strategy configured, giving up");
            return Ok(false);
        }

        self.pause_short()?;
        let items = self.profile.ap.clone();
        for item in &items {
            if item.reveal {
                self.swipe("ap_reveal")?;
                self.pause_short()?;
            }
            if self.find_and_tap(&item.name, None)? {
                self.pause_short()?;
                if self.find_and_tap(DECIDE, None)? {
                    log::info!("used AP item '{}'", item.name);
                    self.wait_visible(REFRESH_FRIENDS)?;
                    return Ok(true);
                }
            }
        }
        log::warn!("every AP recovery item failed");
        Ok(false)
    }

    /// One pass over the support list: poll-swipe cycles until a roster
    /// entry matches, first match wins. Empty-handed after
    /// `retry.friend_polls` cycles.
    fn find_friend(&mut self) -> Result<Option<String>, BotError> {
        self.wait_visible(REFRESH_FRIENDS)?;
        let threshold = self.profile.threshold;
        for _ in 0..self.profile.retry.friend_polls {
            self.pause_short()?;
            for name in &self.friend_names {
                if self.screen.exists(name, Some(threshold)) {
                    log::debug!("found support '{name}'");
                    return Ok(Some(name.clone()));
                }
            }
            self.swipe("friend")?;
        }
        Ok(None)
    }

    /// Search the support list, refreshing it when a full pass finds no
    /// acceptable entry. Bounded by `retry.friend_refreshes`.
    fn select_friend(&mut self) -> Result<String, BotError> {
        if let Some(name) = self.find_friend()? {
            return Ok(name);
        }
        let limit = self.profile.retry.friend_refreshes;
        for _ in 0..limit {
            log::info!("no acceptable support on the list, refreshing");
            self.find_and_tap(REFRESH_FRIENDS, None)?;
            self.pause_short()?;
            self.find_and_tap(YES, None)?;
            self.pause_short()?;
            if let Some(name) = self.find_friend()? {
                return Ok(name);
            }
        }
        Err(BotError::Timeout {
            target: "support roster".to_string(),
            attempts: limit,
        })
    }
}

fn validate_cards(cards: &[u8]) -> Result<(), ConfigError> {
    let err = |reason: &'static str| ConfigError::InvalidCardSet {
        cards: cards.to_vec(),
        reason,
    };
    if cards.len() != 3 {
        return Err(err("exactly 3 cards are required"));
    }
    if cards.iter().any(|c| !(1..=8).contains(c)) {
        return Err(err("cards must be in [1, 8]"));
    }
    if cards[0] == cards[1] || cards[0] == cards[2] || cards[1] == cards[2] {
        return Err(err("cards must be distinct"));
    }
    Ok(())
}
