//! Benchmark for safe-location resolution.
//!
//! TARGET: worst-case full column scan under 10 microseconds
//!
//! Run with: cargo bench --package lastlife_world --bench safe_location_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lastlife_shared::{BlockPos, Location};
use lastlife_world::{Material, SafeLocationResolver, SafetyChecks, VoxelWorld};

fn plains() -> VoxelWorld {
    let mut world = VoxelWorld::new("world");
    world.fill(BlockPos::new(-2, -64, -2), BlockPos::new(2, 62, 2), Material::Stone);
    world.fill(BlockPos::new(-2, 63, -2), BlockPos::new(2, 63, 2), Material::GrassBlock);
    world
}

fn benchmark_safe_candidate(c: &mut Criterion) {
    let world = plains();
    let resolver = SafeLocationResolver::new();
    let candidate = Location::new("world", 0.5, 64.0, 0.5);

    c.bench_function("resolve_safe_candidate", |b| {
        b.iter(|| black_box(resolver.resolve(&world, black_box(&candidate))));
    });
}

fn benchmark_full_scan(c: &mut Criterion) {
    // Open shaft to the bottom of the world: every row is scanned.
    let mut world = plains();
    world.fill_column(0, 0, -64, 300, Material::Air);
    world.set_block(BlockPos::new(0, 300, 0), Material::Stone);
    let resolver = SafeLocationResolver::new();
    let candidate = Location::new("world", 0.5, 300.0, 0.5);

    c.bench_function("resolve_full_column_scan", |b| {
        b.iter(|| black_box(resolver.resolve(&world, black_box(&candidate))));
    });
}

fn benchmark_strict_checks(c: &mut Criterion) {
    let world = plains();
    let resolver = SafeLocationResolver::with_checks(SafetyChecks::ALL);
    let candidate = Location::new("world", 0.5, 64.0, 0.5);

    c.bench_function("resolve_with_all_checks", |b| {
        b.iter(|| black_box(resolver.resolve(&world, black_box(&candidate))));
    });
}

criterion_group!(
    benches,
    benchmark_safe_candidate,
    benchmark_full_scan,
    benchmark_strict_checks
);
criterion_main!(benches);
