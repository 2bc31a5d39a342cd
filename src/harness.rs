//! Scripted-run harness shared by the headless shell, integration tests and
//! benches.
//!
//! A script is a JSON document listing actions at absolute ticks:
//!
//! ```json
//! {
//!   "name": "range-warmup",
//!   "ticks": 6,
//!   "actions": [
//!     { "tick": 1, "type": "move", "x": 0.0, "y": 1.0 },
//!     { "tick": 2, "type": "fire" },
//!     { "tick": 3, "type": "reload", "slot": 0 }
//!   ]
//! }
//! ```
//!
//! Runs submit each tick's actions just before stepping that tick, so a run
//! can be cut at any tick, saved, restored into a new instance and continued.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use axiom_core::content::PLACEHOLDER_PLAYER_ID;
use axiom_core::{ActionBatch, ContentLoadParams, Core, CreateParams, SnapshotView};
use axiom_types::{Action, ActionKind, Event, FireBlockedReason, RawAction};

fn default_actor() -> u32 {
    PLACEHOLDER_PLAYER_ID
}

/// One scripted input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptAction {
    Move {
        x: f32,
        y: f32,
    },
    Look {
        yaw: f32,
        #[serde(default)]
        pitch: f32,
    },
    Fire {
        #[serde(default)]
        slot: u32,
    },
    Reload {
        #[serde(default)]
        slot: u32,
    },
    Sprint {
        held: bool,
    },
    Crouch,
}

impl From<ScriptAction> for ActionKind {
    fn from(action: ScriptAction) -> Self {
        match action {
            ScriptAction::Move { x, y } => ActionKind::MoveIntent { x, y },
            ScriptAction::Look { yaw, pitch } => ActionKind::LookIntent { yaw, pitch },
            ScriptAction::Fire { slot } => ActionKind::FireOnce { weapon_slot: slot },
            ScriptAction::Reload { slot } => ActionKind::Reload { weapon_slot: slot },
            ScriptAction::Sprint { held } => ActionKind::SprintHeld { held: held.into() },
            ScriptAction::Crouch => ActionKind::CrouchToggle { toggle: 1 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub tick: u64,
    #[serde(default = "default_actor")]
    pub actor: u32,
    #[serde(flatten)]
    pub action: ScriptAction,
}

impl ScriptEntry {
    pub fn to_raw(&self) -> RawAction {
        RawAction::from(Action {
            tick: self.tick,
            actor_id: self.actor,
            kind: self.action.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionScript {
    #[serde(default)]
    pub name: String,
    /// Last tick the run steps to.
    pub ticks: u64,
    #[serde(default)]
    pub actions: Vec<ScriptEntry>,
}

impl ActionScript {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid action script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Wire actions targeting `tick`, in script order.
    pub fn actions_at(&self, tick: u64) -> Vec<RawAction> {
        self.actions
            .iter()
            .filter(|e| e.tick == tick)
            .map(ScriptEntry::to_raw)
            .collect()
    }

    /// Five shots on consecutive ticks: destroys target 100.
    pub fn first_kill() -> Self {
        Self {
            name: "first-kill".into(),
            ticks: 5,
            actions: (1..=5).map(fire).collect(),
        }
    }

    /// Empty the magazine, hit the empty-mag block, reload under fire, and
    /// fire once more after the reload lands.
    pub fn reload_cycle() -> Self {
        let mut actions: Vec<_> = (1..=13).map(fire).collect();
        actions.push(ScriptEntry {
            tick: 14,
            actor: PLACEHOLDER_PLAYER_ID,
            action: ScriptAction::Reload { slot: 0 },
        });
        actions.extend((15..=42).map(fire));
        actions.push(fire(44));
        Self {
            name: "reload-cycle".into(),
            ticks: 44,
            actions,
        }
    }
}

fn fire(tick: u64) -> ScriptEntry {
    ScriptEntry {
        tick,
        actor: PLACEHOLDER_PLAYER_ID,
        action: ScriptAction::Fire { slot: 0 },
    }
}

/// Aggregate combat counters over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub damage_total: i64,
    pub targets_destroyed: u32,
    pub fire_blocked_reloading: u32,
    pub fire_blocked_empty: u32,
    pub reloads_started: u32,
    pub reloads_done: u32,
}

impl RunCounters {
    pub fn observe(&mut self, events: &[Event]) {
        for ev in events {
            match *ev {
                Event::DamageDealt { amount, .. } => self.damage_total += i64::from(amount),
                Event::TargetDestroy { .. } => self.targets_destroyed += 1,
                Event::FireBlocked { reason, .. } => match reason {
                    FireBlockedReason::Reloading => self.fire_blocked_reloading += 1,
                    FireBlockedReason::EmptyMag => self.fire_blocked_empty += 1,
                },
                Event::ReloadStarted { .. } => self.reloads_started += 1,
                Event::ReloadDone { .. } => self.reloads_done += 1,
            }
        }
    }

    pub fn fire_blocked(&self) -> u32 {
        self.fire_blocked_reloading + self.fire_blocked_empty
    }

    /// Combine counters of two run segments.
    pub fn merged(self, other: Self) -> Self {
        Self {
            damage_total: self.damage_total + other.damage_total,
            targets_destroyed: self.targets_destroyed + other.targets_destroyed,
            fire_blocked_reloading: self.fire_blocked_reloading + other.fire_blocked_reloading,
            fire_blocked_empty: self.fire_blocked_empty + other.fire_blocked_empty,
            reloads_started: self.reloads_started + other.reloads_started,
            reloads_done: self.reloads_done + other.reloads_done,
        }
    }
}

/// Events observed on one tick, as decoded from that tick's snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    pub tick: u64,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunLog {
    pub ticks: Vec<TickRecord>,
    pub counters: RunCounters,
}

impl RunLog {
    pub fn events_at(&self, tick: u64) -> &[Event] {
        self.ticks
            .iter()
            .find(|r| r.tick == tick)
            .map(|r| r.events.as_slice())
            .unwrap_or(&[])
    }
}

/// Create an instance and load the placeholder content from `root`.
pub fn load_core(root: &Path) -> Result<Core> {
    let mut core = Core::create(CreateParams::v1()).context("core create failed")?;
    core.load_content(&ContentLoadParams::v1(root))
        .with_context(|| format!("content load from {} failed", root.display()))?;
    Ok(core)
}

/// Step `core` one tick at a time up to and including `until`, submitting
/// each tick's scripted actions just before stepping it.
pub fn run_until(core: &mut Core, script: &ActionScript, until: u64) -> Result<RunLog> {
    let mut log = RunLog::default();
    while core.tick() < until {
        let next = core.tick() + 1;
        let raws = script.actions_at(next);
        core.submit(&ActionBatch::v1(&raws))
            .with_context(|| format!("submit for tick {next} failed"))?;
        core.step(1)
            .with_context(|| format!("step to tick {next} failed"))?;

        let snap = SnapshotView::parse(&core.snapshot_bytes()?)?;
        log.counters.observe(&snap.events);
        log.ticks.push(TickRecord {
            tick: snap.tick,
            events: snap.events,
        });
    }
    Ok(log)
}

/// Run the whole script on `core`.
pub fn run_script(core: &mut Core, script: &ActionScript) -> Result<RunLog> {
    run_until(core, script, script.ticks)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponReport {
    pub ammo_in_mag: i32,
    pub ammo_reserve: i32,
    pub reloading: bool,
    pub reload_ticks_remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetReport {
    pub id: u32,
    pub hp: i32,
    pub dead: bool,
}

/// Final state summary printed by the headless shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub script: String,
    pub tick: u64,
    pub lifecycle: String,
    pub counters: RunCounters,
    pub evicted_actions: u64,
    pub weapon: Option<WeaponReport>,
    pub targets: Vec<TargetReport>,
    pub snapshot_bytes: usize,
    pub core_version: String,
    pub build_hash: String,
}

impl RunReport {
    pub fn collect(core: &mut Core, script: &str, counters: RunCounters) -> Result<Self> {
        let snapshot = core.snapshot_bytes()?;
        let snap = SnapshotView::parse(&snapshot)?;
        let diag = core.diagnostics();

        Ok(Self {
            script: script.to_string(),
            tick: snap.tick,
            lifecycle: core.lifecycle().to_string(),
            counters,
            evicted_actions: core.evicted_action_count(),
            weapon: snap.weapon.map(|w| WeaponReport {
                ammo_in_mag: w.ammo_in_mag,
                ammo_reserve: w.ammo_reserve,
                reloading: w.reloading(),
                reload_ticks_remaining: w.reload_ticks_remaining,
            }),
            targets: snap
                .entities
                .iter()
                .filter(|e| e.is_target())
                .map(|e| TargetReport {
                    id: e.id,
                    hp: e.hp,
                    dead: e.is_dead(),
                })
                .collect(),
            snapshot_bytes: snapshot.len(),
            core_version: diag.version_string.to_string(),
            build_hash: diag.build_hash.to_string(),
        })
    }
}
