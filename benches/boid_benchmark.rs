/*
 * Shoal Benchmark
 *
 * Measures the per-frame cost of the flocking core: rebuilding the flock
 * index, answering neighbor queries for every fish, and full simulation
 * steps in sequential and parallel mode.
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shoal::{Bounds, BoundingSphere, FlockIndex, Simulation, SimulationParams, SphereRaycaster, Vec3};
use std::time::Duration;

const FLOCK_SIZES: [usize; 4] = [100, 500, 1000, 2000];

fn random_positions(n: usize, bounds: Bounds) -> Vec<Vec3> {
    let mut rng = ChaCha8Rng::seed_from_u64(n as u64);
    (0..n)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-bounds.half_width()..bounds.half_width()),
                rng.gen_range(-bounds.half_height()..bounds.half_height()),
                rng.gen_range(-bounds.half_depth()..bounds.half_depth()),
            )
        })
        .collect()
}

fn reef() -> Vec<BoundingSphere> {
    (0..8)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::TAU / 8.0;
            BoundingSphere::new(Vec3::new(angle.cos() * 120.0, -30.0, angle.sin() * 60.0), 12.0)
        })
        .collect()
}

// Benchmark rebuilding the flock index
fn bench_index_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_rebuild");
    let bounds = Bounds::default();

    for n in FLOCK_SIZES {
        let positions = random_positions(n, bounds);
        let mut index = FlockIndex::new(bounds, 15.0);

        group.bench_with_input(BenchmarkId::from_parameter(n), &positions, |b, positions| {
            b.iter(|| black_box(index.rebuild(positions.iter().copied())));
        });
    }

    group.finish();
}

// Benchmark one neighbor query per fish
fn bench_neighbor_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighbor_queries");
    let bounds = Bounds::default();

    for n in FLOCK_SIZES {
        let positions = random_positions(n, bounds);
        let mut index = FlockIndex::new(bounds, 15.0);
        index.rebuild(positions.iter().copied());
        let mut out = Vec::new();

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut total = 0;
                for i in 0..n {
                    index.query_neighbors(i, &mut out);
                    total += out.len();
                }
                black_box(total)
            });
        });
    }

    group.finish();
}

// Benchmark full simulation steps
fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");
    let obstacles = reef();

    for parallel in [false, true] {
        let label = if parallel { "parallel" } else { "sequential" };

        for n in FLOCK_SIZES {
            let params = SimulationParams {
                fish_count: n,
                seed: Some(1),
                enable_parallel: parallel,
                ..SimulationParams::default()
            };
            let mut sim = Simulation::new(params).unwrap();

            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, _| {
                b.iter(|| black_box(sim.step(&obstacles, &SphereRaycaster)));
            });
        }
    }

    group.finish();
}

// Configure the benchmarks
criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));
    targets = bench_index_rebuild, bench_neighbor_queries, bench_step
}
criterion_main!(benches);
