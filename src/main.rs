//! mashu CLI - unattended quest farming
//!
//! Loads a profile (or falls back to the defaults), connects to the device
//! over adb, registers a plain attack script for every stage, and farms the
//! configured quest. Custom stage scripts belong in code built on the
//! library; this binary covers the no-skill farming case.
//!
//! Usage: `mashu [profile.json] [max_loops]`

use std::path::Path;
use std::process;

use fgo_mashu::{build_oracle, AdbDevice, BattleBot, BattleRunner, ButtonLayout, Device, Profile};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        log::error!("{err}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let profile = match args.next() {
        Some(path) => Profile::from_path(path)?,
        None => Profile::default(),
    };
    let max_loops: u32 = match args.next() {
        Some(n) => n.parse()?,
        None => 3,
    };

    let layout = if Path::new("buttons.json").exists() {
        ButtonLayout::from_path("buttons.json")?
    } else {
        ButtonLayout::default()
    };

    let mut device = AdbDevice::new();
    if !device.connected() {
        match &profile.device {
            Some(address) => device.connect(address)?,
            None => return Err("no device connected and no address configured".into()),
        }
    }

    let oracle = build_oracle(&profile)?;
    let stage_count = profile.stage_count;
    let bot = BattleBot::new(device, oracle, layout, profile);
    let mut runner = BattleRunner::new(bot);

    // no per-stage script configured: pick the first three cards each round
    for stage in 1..=stage_count {
        runner.at_stage(stage, |bot| bot.attack(&[1, 2, 3]))?;
    }

    let summary = runner.run(max_loops)?;
    match summary.average_time {
        Some(average) => println!(
            "{} battles in {:.1?} ({:.1?} per battle)",
            summary.battles, summary.total_time, average
        ),
        None => println!("no battles completed"),
    }
    Ok(())
}
