//! Headless host shell (default binary).
//!
//! Drives one core instance through an action script and prints a JSON run
//! report. Optionally resumes from a save blob and writes one at the end.
//!
//! Usage:
//!   axiom-headless                          # built-in first-kill scenario
//!   axiom-headless --scenario reload-cycle
//!   axiom-headless --script range.json --save-out range.axsv
//!   axiom-headless --script range.json --load-from range.axsv --ticks 80
//!
//! `RUST_LOG=axiom_core=debug` shows core logging.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use axiom_sim::harness::{self, ActionScript, RunReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    FirstKill,
    ReloadCycle,
}

#[derive(Debug, Parser)]
#[command(name = "axiom-headless")]
#[command(about = "Run the Axiom simulation core headless from an action script")]
struct Args {
    /// Content root handed to the content source
    #[arg(long, env = "AXIOM_CONTENT_ROOT", default_value = "content")]
    content_root: PathBuf,

    /// JSON action script; overrides --scenario
    #[arg(long, env = "AXIOM_SCRIPT")]
    script: Option<PathBuf>,

    /// Built-in script used when no --script is given
    #[arg(long, value_enum, default_value = "first-kill")]
    scenario: Scenario,

    /// Step to this tick instead of the script's own length
    #[arg(long, env = "AXIOM_TICKS")]
    ticks: Option<u64>,

    /// Restore this save blob before running
    #[arg(long)]
    load_from: Option<PathBuf>,

    /// Write a save blob here after the run
    #[arg(long)]
    save_out: Option<PathBuf>,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let report = run(&args)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

fn run(args: &Args) -> Result<RunReport> {
    let script = match &args.script {
        Some(path) => ActionScript::load(path)?,
        None => match args.scenario {
            Scenario::FirstKill => ActionScript::first_kill(),
            Scenario::ReloadCycle => ActionScript::reload_cycle(),
        },
    };
    let until = args.ticks.unwrap_or(script.ticks);

    let mut core = harness::load_core(&args.content_root)?;

    if let Some(path) = &args.load_from {
        let blob =
            fs::read(path).with_context(|| format!("failed to read save {}", path.display()))?;
        core.load_save(&blob)
            .with_context(|| format!("failed to restore {}", path.display()))?;
        log::info!("resumed {} at tick {}", path.display(), core.tick());
    }
    if core.tick() > until {
        bail!(
            "save is at tick {} but the run stops at tick {until}",
            core.tick()
        );
    }

    let log = harness::run_until(&mut core, &script, until)?;
    log::info!(
        "ran {} ticks of '{}' ({} damage, {} destroyed)",
        log.ticks.len(),
        script.name,
        log.counters.damage_total,
        log.counters.targets_destroyed
    );

    if let Some(path) = &args.save_out {
        let blob = core.save_bytes()?;
        fs::write(path, &blob)
            .with_context(|| format!("failed to write save {}", path.display()))?;
        log::info!("wrote {} byte save to {}", blob.len(), path.display());
    }

    RunReport::collect(&mut core, &script.name, log.counters)
}
