use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use pgex::{CallbackError, FileSchema, ObjectSchema, StrInput};

#[derive(Default, Debug, Clone, PartialEq)]
struct Block {
    id: u32,
    x: i64,
    y: i64,
    w: u32,
    h: u32,
    invisible: bool,
    layer: String,
}

#[derive(Default)]
struct Level {
    blocks: Vec<Block>,
}

fn block_schema() -> Arc<ObjectSchema<Block>> {
    Arc::new(
        ObjectSchema::builder()
            .field("ID", |b: &Block| &b.id, |b: &mut Block| &mut b.id)
            .field("X", |b: &Block| &b.x, |b: &mut Block| &mut b.x)
            .field("Y", |b: &Block| &b.y, |b: &mut Block| &mut b.y)
            .field("W", |b: &Block| &b.w, |b: &mut Block| &mut b.w)
            .field("H", |b: &Block| &b.h, |b: &mut Block| &mut b.h)
            .field("IV", |b: &Block| &b.invisible, |b: &mut Block| {
                &mut b.invisible
            })
            .field("LR", |b: &Block| &b.layer, |b: &mut Block| &mut b.layer)
            .build(),
    )
}

fn on_block(level: &mut Level, block: Block) -> Result<bool, CallbackError> {
    level.blocks.push(block);
    Ok(true)
}

fn put_block(level: &mut Level, out: &mut Block, index: usize) -> bool {
    match level.blocks.get(index) {
        Some(block) => {
            *out = block.clone();
            true
        }
        None => false,
    }
}

fn level_file() -> FileSchema<Level> {
    FileSchema::builder()
        .section("BLOCK", &block_schema(), Some(on_block), Some(put_block))
        .build()
}

fn synthetic_level(blocks: usize) -> Level {
    let mut level = Level::default();
    for index in 0..blocks {
        level.blocks.push(Block {
            id: (index % 638) as u32 + 1,
            x: -200_000 + (index as i64 % 400) * 32,
            y: -200_600 + (index as i64 / 400) * 32,
            w: 32,
            h: 32,
            invisible: index % 17 == 0,
            layer: "Default".to_string(),
        });
    }
    level
}

fn bench_roundtrip(c: &mut Criterion) {
    let schema = level_file();
    let mut source = synthetic_level(10_000);
    let text = schema.save_to_string(&mut source).expect("save");

    let mut group = c.benchmark_group("level_blocks");
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("load", |b| {
        b.iter(|| {
            let mut level = Level::default();
            let ok = schema.load(&mut StrInput::new(black_box(&text)), &mut level, None);
            assert!(ok);
            black_box(level.blocks.len())
        })
    });

    group.bench_function("save", |b| {
        b.iter(|| {
            let out = schema.save_to_string(black_box(&mut source)).expect("save");
            black_box(out.len())
        })
    });

    group.bench_function("load_save", |b| {
        b.iter(|| {
            let mut level = Level::default();
            schema.load(&mut StrInput::new(&text), &mut level, None);
            let out = schema.save_to_string(&mut level).expect("save");
            black_box(out.len())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_roundtrip);
criterion_main!(benches);
