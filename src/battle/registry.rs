//! Stage script registration
//!
//! Each battle stage gets exactly one user-supplied action script. Scripts
//! are registered before a run starts and never change during one.

use std::collections::BTreeMap;

use crate::config::ConfigError;
use crate::device::Device;
use crate::vision::Screen;

use super::{BattleBot, BotError};

/// A scripted action sequence for one battle stage
pub type StageHandler<D, S> = Box<dyn FnMut(&mut BattleBot<D, S>) -> Result<(), BotError>>;

/// Holds at most one handler per stage index in `[1, stage_count]`
pub struct StageHandlerRegistry<D: Device, S: Screen> {
    stage_count: u32,
    handlers: BTreeMap<u32, StageHandler<D, S>>,
}

impl<D: Device, S: Screen> StageHandlerRegistry<D, S> {
    pub fn new(stage_count: u32) -> Self {
        Self {
            stage_count,
            handlers: BTreeMap::new(),
        }
    }

    /// Register the script for one stage. Registering a stage twice or
    /// outside `[1, stage_count]` is a configuration error.
    pub fn register(
        &mut self,
        stage: u32,
        handler: impl FnMut(&mut BattleBot<D, S>) -> Result<(), BotError> + 'static,
    ) -> Result<(), ConfigError> {
        if stage < 1 || stage > self.stage_count {
            return Err(ConfigError::StageOutOfRange {
                stage,
                stage_count: self.stage_count,
            });
        }
        if self.handlers.contains_key(&stage) {
            return Err(ConfigError::DuplicateStageHandler(stage));
        }
        log::debug!("handler registered for stage {stage}");
        self.handlers.insert(stage, Box::new(handler));
        Ok(())
    }

    pub fn get_mut(&mut self, stage: u32) -> Result<&mut StageHandler<D, S>, ConfigError> {
        self.handlers
            .get_mut(&stage)
            .ok_or(ConfigError::MissingStageHandler(stage))
    }

    /// Check that every stage in `[1, stage_count]` has a handler.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for stage in 1..=self.stage_count {
            if !self.handlers.contains_key(&stage) {
                return Err(ConfigError::MissingStageHandler(stage));
            }
        }
        Ok(())
    }
}
