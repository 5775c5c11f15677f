//! Benchmarks for zoom clustering and path building on synthetic herds.
//!
//! Run with: `cargo bench --bench clustering --features synthetic`

use chrono::Duration;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use herdtrack::synthetic::{HerdScenario, random_track};
use herdtrack::{AnimalId, Coordinate, PathBuilder, SpatialClusterer, ZoomKey, ZoomProfile};

fn scenario(animals_per_herd: usize) -> HerdScenario {
    HerdScenario {
        origin: Coordinate::new(7_903_000.0, 6_621_000.0),
        herd_count: 6,
        animals_per_herd,
        herd_spread_m: 2_500.0,
        herd_separation_m: 15_000.0,
        stray_count: animals_per_herd / 5,
        seed: 42,
    }
}

fn bench_cluster_levels(c: &mut Criterion) {
    let profile = ZoomProfile::default();
    let clusterer = SpatialClusterer::new(&profile);
    let snapshot = scenario(100).generate();

    let mut group = c.benchmark_group("cluster_levels");
    for (level, _) in profile.levels() {
        group.bench_with_input(BenchmarkId::new("level", level), &level, |b, &level| {
            b.iter(|| clusterer.cluster(&snapshot.points, ZoomKey::Level(level)));
        });
    }
    group.bench_function("overview", |b| {
        b.iter(|| clusterer.cluster(&snapshot.points, ZoomKey::Overview));
    });
    group.finish();
}

fn bench_cluster_scaling(c: &mut Criterion) {
    let profile = ZoomProfile::default();
    let clusterer = SpatialClusterer::new(&profile);

    let mut group = c.benchmark_group("cluster_scaling");
    for per_herd in [10, 50, 250, 1_000] {
        let snapshot = scenario(per_herd).generate();
        group.bench_with_input(
            BenchmarkId::new("level_11", snapshot.points.len()),
            &snapshot.points,
            |b, points| {
                b.iter(|| clusterer.cluster(points, ZoomKey::Level(11)));
            },
        );
    }
    group.finish();
}

fn bench_build_path(c: &mut Criterion) {
    let builder = PathBuilder::default();

    let mut group = c.benchmark_group("build_path");
    for steps in [10, 1_000, 50_000] {
        let track = random_track(
            AnimalId(1),
            Coordinate::new(7_903_000.0, 6_621_000.0),
            steps,
            Duration::minutes(15),
            300.0,
            7,
        );
        group.bench_with_input(BenchmarkId::new("points", steps), &track, |b, track| {
            b.iter(|| builder.build(track));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_cluster_levels,
    bench_cluster_scaling,
    bench_build_path
);
criterion_main!(benches);
