//! Grid benchmarks for hexworld_core.
//!
//! Run with: `cargo bench -p hexworld_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hexworld_core::prelude::*;

/// Address resolution and range queries on the standard map.
pub fn grid_benchmark(c: &mut Criterion) {
    let config = WorldConfig::standard();
    let Ok(grid) = HexGrid::generate(&config) else {
        return;
    };

    c.bench_function("resolve_wrapped", |b| {
        b.iter(|| {
            for x in -60..120 {
                black_box(grid.resolve(black_box(x), 15).ok());
            }
        });
    });

    let Ok(center) = grid.resolve(30, 15) else {
        return;
    };
    c.bench_function("hexes_within_range_5", |b| {
        b.iter(|| black_box(grid.hexes_within_range(black_box(center), 5).ok()));
    });
}

/// Full generate-and-classify of the standard and large maps.
pub fn generation_benchmark(c: &mut Criterion) {
    let standard = WorldConfig::standard();
    c.bench_function("generate_standard", |b| {
        b.iter(|| black_box(HexGrid::generate(black_box(&standard)).ok()));
    });

    let large = WorldConfig::large();
    c.bench_function("generate_large", |b| {
        b.iter(|| black_box(HexGrid::generate(black_box(&large)).ok()));
    });
}

/// Path planning across the seam of the standard map.
pub fn pathfinding_benchmark(c: &mut Criterion) {
    let config = WorldConfig::standard().with_generator(GeneratorKind::FlatOcean);
    let Ok(grid) = HexGrid::generate(&config) else {
        return;
    };
    let overlay = MovementOverlay::new();
    let nav = NavContext::new(&grid, &overlay);
    let (Ok(start), Ok(goal)) = (grid.resolve(2, 3), grid.resolve(50, 25)) else {
        return;
    };

    c.bench_function("find_path_naval", |b| {
        b.iter(|| black_box(find_path(&nav, start, goal, MovementCapability::Naval).ok()));
    });
}

criterion_group!(benches, grid_benchmark, generation_benchmark, pathfinding_benchmark);
criterion_main!(benches);
