#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use nbtlink::tag::Compound;
use nbtlink::{Engine, Linked, Schema};
use std::hint::black_box;

#[derive(Default, Linked)]
#[nbtlink(auto)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Default, Linked)]
#[nbtlink(auto)]
pub struct Player {
    pub name: String,
    pub level: i32,
    pub experience: f64,
    pub position: Position,
}

fn stats_schema() -> Schema {
    Schema::builder("player_stats")
        .int("level")
        .double("experience")
        .string("title")
        .long_array("history")
        .build()
}

// --- BENCHMARKS ---

fn bench_schema(c: &mut Criterion) {
    let engine = Engine::new();
    let schema = stats_schema();
    let mut root = Compound::new();
    engine.prepare(&schema, &mut root);

    c.bench_function("schema_prepare_existing", |b| {
        b.iter(|| black_box(engine.prepare(&schema, &mut root)))
    });

    c.bench_function("schema_use_fresh", |b| {
        b.iter_batched(
            Compound::new,
            |mut tree| {
                engine.use_schema(&schema, &mut tree, |data| data.put("level", 3));
                black_box(tree)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_linking(c: &mut Criterion) {
    let mut engine = Engine::new();
    engine.register_linked::<Position>();
    engine.register_linked::<Player>();
    let Ok(schema) = engine.derive_schema::<Player>("player") else {
        return;
    };
    let mut root = Compound::new();

    c.bench_function("use_linked_roundtrip", |b| {
        b.iter(|| {
            let mut player = Player::default();
            let report = engine.use_linked(&schema, &mut player, &mut root, |p| p.level += 1);
            black_box(report.map(|r| r.linked))
        })
    });
}

criterion_group!(benches, bench_schema, bench_linking);
criterion_main!(benches);
