//! Save/continue: restoring a save is indistinguishable from never stopping.

use std::path::Path;

use proptest::prelude::*;

use axiom_sim::core::content::{ContentSet, ContentSource, PlaceholderContent};
use axiom_sim::core::save::{checksum32, CHECKSUM_OFFSET};
use axiom_sim::core::{
    ActionBatch, ContentLoadParams, Core, CoreError, CoreResult, CreateParams, Lifecycle,
    SnapshotView,
};
use axiom_sim::harness::{self, ActionScript, ScriptAction, ScriptEntry};
use axiom_sim::types::RawAction;

fn fresh() -> Core {
    harness::load_core(Path::new("content")).unwrap()
}

fn view(core: &mut Core) -> SnapshotView {
    SnapshotView::parse(&core.snapshot_bytes().unwrap()).unwrap()
}

/// Reload cycle with some movement mixed in, run a little past the reload.
fn combat_script() -> ActionScript {
    let mut script = ActionScript::reload_cycle();
    script.name = "combat".into();
    script.ticks = 50;
    for (tick, action) in [
        (3, ScriptAction::Move { x: 1.0, y: 1.0 }),
        (9, ScriptAction::Look {
            yaw: 0.3,
            pitch: 0.0,
        }),
        (20, ScriptAction::Move { x: -0.5, y: 0.2 }),
        (47, ScriptAction::Fire { slot: 0 }),
        (48, ScriptAction::Reload { slot: 0 }),
    ] {
        script.actions.push(ScriptEntry {
            tick,
            actor: 1,
            action,
        });
    }
    script
}

fn assert_continuation_matches(split_at: u64) {
    let script = combat_script();

    let mut straight = fresh();
    let full = harness::run_script(&mut straight, &script).unwrap();

    let mut first = fresh();
    let head = harness::run_until(&mut first, &script, split_at).unwrap();
    let blob = first.save_bytes().unwrap();
    drop(first);

    let mut resumed = fresh();
    resumed.load_save(&blob).unwrap();
    assert_eq!(resumed.tick(), split_at);
    let tail = harness::run_script(&mut resumed, &script).unwrap();

    assert_eq!(
        head.counters.merged(tail.counters),
        full.counters,
        "split at {split_at}"
    );
    assert_eq!(tail.ticks[..], full.ticks[split_at as usize..]);
    assert_eq!(resumed.world().entities(), straight.world().entities());
    assert_eq!(resumed.world().weapon(), straight.world().weapon());
    assert_eq!(
        resumed.snapshot_bytes().unwrap(),
        straight.snapshot_bytes().unwrap()
    );
}

#[test]
fn restored_snapshot_matches_saved_tick() {
    let script = combat_script();
    for t in [1, 7, 13, 25, 43, 50] {
        let mut core = fresh();
        harness::run_until(&mut core, &script, t).unwrap();
        let at_save = view(&mut core);
        let blob = core.save_bytes().unwrap();

        let mut restored = fresh();
        restored.load_save(&blob).unwrap();
        let after_load = view(&mut restored);

        assert_eq!(after_load.tick, at_save.tick);
        assert_eq!(after_load.entities, at_save.entities, "tick {t}");
        assert_eq!(after_load.weapon, at_save.weapon, "tick {t}");
        assert!(after_load.events.is_empty());
    }
}

#[test]
fn continuation_mid_combat() {
    assert_continuation_matches(7);
}

#[test]
fn continuation_mid_reload() {
    // reload starts on tick 14 and lands on tick 43
    assert_continuation_matches(25);
}

#[test]
fn continuation_on_reload_start_tick() {
    assert_continuation_matches(14);
}

#[test]
fn load_save_keeps_lifecycle() {
    let mut source = fresh();
    source.step(3).unwrap();
    let blob = source.save_bytes().unwrap();

    let mut target = fresh();
    assert_eq!(target.lifecycle(), Lifecycle::ContentLoaded);
    target.load_save(&blob).unwrap();
    assert_eq!(target.lifecycle(), Lifecycle::ContentLoaded);
    assert_eq!(target.tick(), 3);
}

#[test]
fn load_save_requires_content() {
    let blob = fresh().save_bytes().unwrap();
    let mut core = Core::create(CreateParams::v1()).unwrap();
    assert!(matches!(
        core.load_save(&blob),
        Err(CoreError::BadState { .. })
    ));
}

#[test]
fn corrupted_save_leaves_state_untouched() {
    let mut source = fresh();
    harness::run_until(&mut source, &combat_script(), 20).unwrap();
    let mut blob = source.save_bytes().unwrap();
    let mid = blob.len() / 2;
    blob[mid] ^= 0x40;

    let mut core = fresh();
    core.step(2).unwrap();
    let before = core.snapshot_bytes().unwrap();

    let err = core.load_save(&blob).unwrap_err();
    assert!(matches!(err, CoreError::InvalidArg(_)));
    assert!(core.last_error().contains("checksum"), "{}", core.last_error());
    assert_eq!(core.snapshot_bytes().unwrap(), before);
}

#[test]
fn step_past_max_tick_fails_without_touching_state() {
    let mut blob = fresh().save_bytes().unwrap();
    // world chunk tick sits right after the 24-byte header
    blob[24..32].copy_from_slice(&u64::MAX.to_le_bytes());
    let sum = checksum32(&blob);
    blob[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].copy_from_slice(&sum.to_le_bytes());

    let mut core = fresh();
    core.submit(&ActionBatch::v1(&[RawAction::fire_once(5, 1, 0)]))
        .unwrap();
    core.load_save(&blob).unwrap();
    assert_eq!(core.tick(), u64::MAX);
    let before = core.snapshot_bytes().unwrap();

    let err = core.step(1).unwrap_err();
    assert!(matches!(err, CoreError::InvalidArg(_)));
    assert!(core.last_error().contains("overflow"), "{}", core.last_error());
    assert_eq!(core.tick(), u64::MAX);
    assert_eq!(core.snapshot_bytes().unwrap(), before);
    assert_eq!(core.lifecycle(), Lifecycle::ContentLoaded);

    core.step(0).unwrap();
}

#[test]
fn truncated_save_is_rejected() {
    let blob = fresh().save_bytes().unwrap();
    let mut core = fresh();
    for len in [0, 10, 23, 24, blob.len() - 1] {
        assert!(core.load_save(&blob[..len]).is_err(), "len {len}");
    }
    assert_eq!(core.tick(), 0);
}

/// Same range with the targets renumbered.
struct RenumberedRange;

impl ContentSource for RenumberedRange {
    fn load(&self, root: &Path) -> CoreResult<ContentSet> {
        let mut set = PlaceholderContent.load(root)?;
        for e in set.entities.iter_mut().filter(|e| e.is_target()) {
            e.id += 100;
        }
        Ok(set)
    }
}

#[test]
fn save_from_other_content_is_rejected() {
    let blob = fresh().save_bytes().unwrap();

    let mut core =
        Core::create_with_content(CreateParams::v1(), Box::new(RenumberedRange)).unwrap();
    core.load_content(&ContentLoadParams::v1(Path::new("content")))
        .unwrap();
    let before = core.snapshot_bytes().unwrap();

    let err = core.load_save(&blob).unwrap_err();
    assert!(matches!(err, CoreError::InvalidArg(_)));
    assert!(core.last_error().contains("100"), "{}", core.last_error());
    assert_eq!(core.snapshot_bytes().unwrap(), before);
}

#[test]
fn save_size_query_contract() {
    let mut core = fresh();
    let required = core.save(None).unwrap();
    assert_eq!(required, 24 + 68 + 3 * 40);

    let mut small = vec![0u8; required - 1];
    assert_eq!(
        core.save(Some(&mut small[..])),
        Err(CoreError::BufferTooSmall {
            required,
            capacity: required - 1
        })
    );

    let mut exact = vec![0u8; required];
    assert_eq!(core.save(Some(&mut exact[..])).unwrap(), required);
    assert_eq!(&exact[..4], b"AXSV");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn continuation_at_any_tick(split_at in 1u64..50) {
        assert_continuation_matches(split_at);
    }
}
