//! Lifecycle gating at the `Core` boundary.

use std::path::Path;

use axiom_sim::core::{
    ActionBatch, ContentLoadParams, Core, CoreError, CreateParams, Lifecycle, ResultCode,
};
use axiom_sim::types::RawAction;

fn created() -> Core {
    Core::create(CreateParams::v1()).unwrap()
}

fn load(core: &mut Core) {
    core.load_content(&ContentLoadParams::v1(Path::new("content")))
        .unwrap();
}

fn assert_bad_state<T: std::fmt::Debug>(result: Result<T, CoreError>, op: &str) {
    let err = result.unwrap_err();
    assert_eq!(err.code(), ResultCode::BadState, "{op}: {err}");
    assert!(err.to_string().starts_with(op), "{err}");
}

#[test]
fn created_rejects_everything_but_load() {
    let mut core = created();
    let raws = [RawAction::fire_once(1, 1, 0)];

    assert_bad_state(core.submit(&ActionBatch::v1(&raws)), "submit");
    assert_bad_state(core.step(1), "step");
    assert_bad_state(core.step(0), "step");
    assert_bad_state(core.snapshot(None), "snapshot");
    assert_bad_state(core.save(None), "save");
    assert_bad_state(core.load_save(&[0u8; 64]), "load_save");

    // no side effects
    assert_eq!(core.lifecycle(), Lifecycle::Created);
    assert_eq!(core.tick(), 0);
    assert!(core.world().queued_actions().is_empty());
}

#[test]
fn queries_work_in_every_state() {
    let mut core = created();
    assert_eq!(core.diagnostics().current_tick, 0);
    assert_eq!(core.last_error(), "");

    load(&mut core);
    core.step(2).unwrap();
    let diag = core.diagnostics();
    assert_eq!(diag.current_tick, 2);
    assert_eq!((diag.abi_major, diag.abi_minor), (1, 0));
    assert!(diag.version_string.contains("abi 1.0"));
}

#[test]
fn running_is_entered_by_first_real_step() {
    let mut core = created();
    load(&mut core);
    core.step(0).unwrap();
    assert_eq!(core.lifecycle(), Lifecycle::ContentLoaded);
    assert_eq!(core.tick(), 0);

    core.step(3).unwrap();
    assert_eq!(core.lifecycle(), Lifecycle::Running);
    assert_eq!(core.tick(), 3);

    // running keeps accepting the content-loaded operations
    core.submit(&ActionBatch::v1(&[RawAction::fire_once(4, 1, 0)]))
        .unwrap();
    core.step(1).unwrap();
    assert!(core.snapshot(None).is_ok());
    assert!(core.save(None).is_ok());
    assert_eq!(core.lifecycle(), Lifecycle::Running);
}

#[test]
fn double_load_is_rejected() {
    let mut core = created();
    load(&mut core);
    let err = core
        .load_content(&ContentLoadParams::v1(Path::new("content")))
        .unwrap_err();
    assert_eq!(err.code(), ResultCode::BadState);

    core.step(1).unwrap();
    assert!(core
        .load_content(&ContentLoadParams::v1(Path::new("content")))
        .is_err());
    assert_eq!(core.tick(), 1);
}

#[test]
fn unload_returns_to_created_and_allows_reload() {
    let mut core = created();
    load(&mut core);
    core.submit(&ActionBatch::v1(&[RawAction::fire_once(1, 1, 0)]))
        .unwrap();
    core.step(1).unwrap();
    assert_eq!(core.lifecycle(), Lifecycle::Running);

    core.unload();
    assert_eq!(core.lifecycle(), Lifecycle::Created);
    assert!(core.world().entities().is_empty());
    assert!(core.world().weapon().is_none());
    assert!(core.content_root().is_none());
    core.unload();
    assert_eq!(core.lifecycle(), Lifecycle::Created);

    load(&mut core);
    assert_eq!(core.tick(), 0);
    assert_eq!(core.world().entity(100).unwrap().hp, 50);
    assert_eq!(core.content_root(), Some(Path::new("content")));
}

#[test]
fn content_params_are_versioned() {
    let mut core = created();
    let mut params = ContentLoadParams::v1(Path::new("content"));
    params.version = 9;
    assert!(matches!(
        core.load_content(&params),
        Err(CoreError::Unsupported(_))
    ));

    let mut params = ContentLoadParams::v1(Path::new("content"));
    params.size_bytes = 4;
    assert!(matches!(
        core.load_content(&params),
        Err(CoreError::InvalidArg(_))
    ));
    assert_eq!(core.lifecycle(), Lifecycle::Created);
}

#[test]
fn last_error_follows_latest_call() {
    let mut core = created();
    assert!(core.step(1).is_err());
    let first = core.last_error().to_string();
    assert!(first.contains("step"));

    assert!(core.save(None).is_err());
    assert!(core.last_error().contains("save"));
    assert_ne!(core.last_error(), first);

    load(&mut core);
    assert_eq!(core.last_error(), "");
}
