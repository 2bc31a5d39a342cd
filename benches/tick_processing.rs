use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use axiom_sim::core::{save, snapshot, ActionBatch, Core, SaveView};
use axiom_sim::harness::{self, ActionScript};
use axiom_sim::types::RawAction;

fn loaded() -> Core {
    harness::load_core(Path::new("content")).unwrap()
}

fn bench_idle_step(c: &mut Criterion) {
    let mut core = loaded();

    c.bench_function("step_idle_tick", |b| {
        b.iter(|| {
            core.step(black_box(1)).unwrap();
        })
    });
}

fn bench_fire_tick(c: &mut Criterion) {
    c.bench_function("submit_and_step_fire", |b| {
        let mut core = loaded();
        b.iter(|| {
            let next = core.tick() + 1;
            let raws = [RawAction::fire_once(next, 1, 0)];
            core.submit(&ActionBatch::v1(&raws)).unwrap();
            core.step(1).unwrap();
        })
    });
}

fn bench_reload_cycle_script(c: &mut Criterion) {
    let script = ActionScript::reload_cycle();

    c.bench_function("reload_cycle_44_ticks", |b| {
        b.iter(|| {
            let mut core = loaded();
            harness::run_script(&mut core, black_box(&script)).unwrap()
        })
    });
}

fn bench_snapshot_encode(c: &mut Criterion) {
    let core = loaded();
    let mut buf = vec![0u8; snapshot::encoded_len(core.world())];

    c.bench_function("snapshot_encode", |b| {
        b.iter(|| snapshot::encode(black_box(core.world()), &mut buf).unwrap())
    });
}

fn bench_save_parse(c: &mut Criterion) {
    let mut core = loaded();
    let blob = core.save_bytes().unwrap();

    c.bench_function("save_checksum_and_parse", |b| {
        b.iter(|| {
            black_box(save::checksum32(&blob));
            SaveView::parse(black_box(&blob)).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_idle_step,
    bench_fire_tick,
    bench_reload_cycle_script,
    bench_snapshot_encode,
    bench_save_parse
);
criterion_main!(benches);
