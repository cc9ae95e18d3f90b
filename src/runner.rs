//! Multi-battle driver
//!
//! Runs the battle state machine across many battles, collecting per-battle
//! round counts and durations. The first battle is entered from the main
//! menu; every following battle goes through the continue prompt until the
//! loop bound is reached or re-entry fails.

use std::time::{Duration, Instant};

use crate::battle::registry::StageHandlerRegistry;
use crate::battle::{BattleBot, BotError, EnterOutcome};
use crate::config::ConfigError;
use crate::device::Device;
use crate::vision::Screen;

/// Aggregated result of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Completed battles.
    pub battles: u32,
    /// Rounds played per battle, in order.
    pub rounds: Vec<u32>,
    /// Wall-clock time of the whole run.
    pub total_time: Duration,
    /// Average time per battle; `None` when no battle completed.
    pub average_time: Option<Duration>,
}

/// Per-run figures, created fresh for every [`BattleRunner::run`]
#[derive(Debug, Default)]
pub struct RunStatistics {
    battles: u32,
    rounds: Vec<u32>,
}

impl RunStatistics {
    pub fn battles(&self) -> u32 {
        self.battles
    }

    pub fn record(&mut self, rounds: u32, duration: Duration) {
        self.battles += 1;
        self.rounds.push(rounds);
        log::info!(
            "battle {} complete: {} rounds played in {:.1?}",
            self.battles,
            rounds,
            duration
        );
    }

    /// Fold into a summary; the average is left empty at zero battles
    /// rather than dividing by zero.
    pub fn finish(self, total_time: Duration) -> RunSummary {
        let average_time = (self.battles > 0).then(|| total_time / self.battles);
        RunSummary {
            battles: self.battles,
            rounds: self.rounds,
            total_time,
            average_time,
        }
    }
}

/// Drives a [`BattleBot`] and its stage scripts across many battles
pub struct BattleRunner<D: Device, S: Screen> {
    bot: BattleBot<D, S>,
    registry: StageHandlerRegistry<D, S>,
}

impl<D: Device, S: Screen> BattleRunner<D, S> {
    pub fn new(bot: BattleBot<D, S>) -> Self {
        let registry = StageHandlerRegistry::new(bot.stage_count());
        Self { bot, registry }
    }

    /// Register the action script for one stage.
    pub fn at_stage(
        &mut self,
        stage: u32,
        handler: impl FnMut(&mut BattleBot<D, S>) -> Result<(), BotError> + 'static,
    ) -> Result<(), ConfigError> {
        self.registry.register(stage, handler)
    }

    /// The underlying state machine, for supervised single-battle use.
    pub fn bot_mut(&mut self) -> &mut BattleBot<D, S> {
        &mut self.bot
    }

    pub fn enter(&mut self) -> Result<EnterOutcome, BotError> {
        self.bot.enter()
    }

    pub fn reenter(&mut self) -> Result<EnterOutcome, BotError> {
        self.bot.reenter()
    }

    pub fn end_battle(&mut self) -> Result<(), BotError> {
        self.bot.end_battle()
    }

    /// Play every stage of the current battle in ascending order.
    ///
    /// Returns the number of rounds played.
    pub fn play_battle(&mut self) -> Result<u32, BotError> {
        log::info!("handling the battle");
        let stage_count = self.bot.stage_count();
        for stage in 1..=stage_count {
            self.bot.wait_until_attack()?;
            log::debug!("running the stage {stage} script");
            let handler = self.registry.get_mut(stage)?;
            handler(&mut self.bot)?;
            self.bot.pause_long()?;
        }
        Ok(stage_count)
    }

    /// Farm battles until `max_loops` have completed after the first, or
    /// until re-entry fails.
    ///
    /// The initial enter/play/end cycle is unconditional; a failed first
    /// entry reports zero battles.
    pub fn run(&mut self, max_loops: u32) -> Result<RunSummary, BotError> {
        self.registry.validate()?;

        let mut stats = RunStatistics::default();
        let run_start = Instant::now();

        let battle_start = Instant::now();
        match self.bot.enter()? {
            EnterOutcome::ApExhausted => {
                log::info!("could not enter the first battle, quitting");
                return Ok(self.summarize(stats, run_start));
            }
            EnterOutcome::Entered => {}
        }
        let rounds = self.play_battle()?;
        self.end_battle()?;
        stats.record(rounds, battle_start.elapsed());

        while stats.battles() < max_loops {
            let battle_start = Instant::now();
            if self.bot.reenter()? == EnterOutcome::ApExhausted {
                log::info!("could not re-enter the battle, quitting");
                break;
            }
            let rounds = self.play_battle()?;
            self.end_battle()?;
            stats.record(rounds, battle_start.elapsed());
        }

        Ok(self.summarize(stats, run_start))
    }

    fn summarize(&self, stats: RunStatistics, run_start: Instant) -> RunSummary {
        let summary = stats.finish(run_start.elapsed());
        match summary.average_time {
            Some(average) => log::info!(
                "{} battles played in {:.1?}, average {:.1?} per battle",
                summary.battles,
                summary.total_time,
                average
            ),
            None => log::info!("no battles completed"),
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::fixtures::{fast_profile, unit_layout, FakeFrame, FakeItem, FakeScreen, RecordingDevice};

    type TestRunner = BattleRunner<RecordingDevice, FakeScreen>;

    /// A frame state on which every step of a battle cycle succeeds
    /// immediately.
    fn everything_frame() -> FakeFrame {
        FakeFrame::new()
            .with("menu", FakeItem::at(0, 0))
            .with("quest", FakeItem::at(500, 200))
            .with("refresh_friends", FakeItem::at(900, 50))
            .with("friend_0", FakeItem::at(300, 300))
            .with("start_quest", FakeItem::at(1100, 650))
            .with("attack", FakeItem::at(1000, 600))
            .with("next_step", FakeItem::at(1000, 700))
            .with("cont", FakeItem::at(700, 500))
    }

    fn runner_with(frames: Vec<FakeFrame>) -> TestRunner {
        let bot = BattleBot::new(
            RecordingDevice::new(),
            FakeScreen::new(frames),
            unit_layout(),
            fast_profile(1),
        );
        BattleRunner::new(bot)
    }

    fn register_noop_handlers(runner: &mut TestRunner) {
        for stage in 1..=3 {
            runner.at_stage(stage, |_| Ok(())).unwrap();
        }
    }

    #[test]
    fn test_run_requires_complete_registration() {
        let mut runner = runner_with(vec![everything_frame()]);
        runner.at_stage(1, |_| Ok(())).unwrap();

        let result = runner.run(1);

        assert!(matches!(
            result,
            Err(BotError::Config(ConfigError::MissingStageHandler(2)))
        ));
        // validation failed before any screen interaction
        assert!(runner.bot.device().touches().is_empty());
    }

    #[test]
    fn test_handlers_run_once_each_in_ascending_order() {
        let mut runner = runner_with(vec![everything_frame()]);
        let order = Rc::new(RefCell::new(Vec::new()));
        for stage in 1..=3 {
            let order = Rc::clone(&order);
            runner
                .at_stage(stage, move |_| {
                    order.borrow_mut().push(stage);
                    Ok(())
                })
                .unwrap();
        }

        runner.run(0).unwrap();

        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_run_zero_loops_still_plays_the_first_battle() {
        let mut runner = runner_with(vec![everything_frame()]);
        register_noop_handlers(&mut runner);

        let summary = runner.run(0).unwrap();

        assert_eq!(summary.battles, 1);
        assert_eq!(summary.rounds, vec![3]);
        assert!(summary.average_time.is_some());
    }

    #[test]
    fn test_run_is_bounded_by_max_loops() {
        let mut runner = runner_with(vec![everything_frame()]);
        register_noop_handlers(&mut runner);

        let summary = runner.run(2).unwrap();

        assert_eq!(summary.battles, 2);
        assert_eq!(summary.rounds, vec![3, 3]);
    }

    #[test]
    fn test_failed_reentry_ends_the_run_gracefully() {
        // The AP prompt starts appearing partway through the second battle;
        // the second re-entry sees it, and with no recovery strategy the
        // run stops at exactly 2 battles.
        let mut frames = vec![everything_frame(); 24];
        frames.push(everything_frame().with("ap_regen", FakeItem::at(0, 0)));
        let mut runner = runner_with(frames);
        register_noop_handlers(&mut runner);

        let summary = runner.run(5).unwrap();

        assert_eq!(summary.battles, 2);
        assert_eq!(summary.rounds, vec![3, 3]);
    }

    #[test]
    fn test_failed_first_entry_reports_zero_battles() {
        // Quest tap works, then the AP prompt appears with no strategy.
        let frames = vec![
            FakeFrame::new()
                .with("menu", FakeItem::at(0, 0))
                .with("quest", FakeItem::at(500, 200)),
            FakeFrame::new().with("ap_regen", FakeItem::at(0, 0)),
        ];
        let mut runner = runner_with(frames);
        register_noop_handlers(&mut runner);

        let summary = runner.run(3).unwrap();

        assert_eq!(summary.battles, 0);
        assert!(summary.rounds.is_empty());
        assert!(summary.average_time.is_none());
    }

    #[test]
    fn test_supervised_single_battle_mode() {
        let mut runner = runner_with(vec![everything_frame()]);
        register_noop_handlers(&mut runner);

        assert_eq!(runner.enter().unwrap(), EnterOutcome::Entered);
        assert_eq!(runner.play_battle().unwrap(), 3);
        runner.end_battle().unwrap();
    }

    #[test]
    fn test_statistics_average_guards_zero_battles() {
        let stats = RunStatistics::default();
        let summary = stats.finish(Duration::from_secs(5));

        assert_eq!(summary.battles, 0);
        assert!(summary.average_time.is_none());

        let mut stats = RunStatistics::default();
        stats.record(3, Duration::from_secs(2));
        stats.record(3, Duration::from_secs(4));
        let summary = stats.finish(Duration::from_secs(6));

        assert_eq!(summary.battles, 2);
        assert_eq!(summary.average_time, Some(Duration::from_secs(3)));
    }
}
