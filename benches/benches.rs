use agglomerative_clustering::{Config, DistanceCache, Linkage, MergeEngine, Metric, Point};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array;
use ndarray_rand::{rand_distr::Uniform, RandomExt};
use rand::{rngs::StdRng, SeedableRng};

const DIMENSION: usize = 2;

fn random_points(num_points: usize) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    (0..num_points)
        .map(|_| Array::random_using(DIMENSION, Uniform::new(0.0, 100.0), &mut rng))
        .collect()
}

pub fn hierarchies(c: &mut Criterion) {
    let points = random_points(60);
    for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average] {
        let config = Config::new(Metric::Euclidean, linkage);
        c.bench_function(&format!("60 uniform points, {linkage} linkage"), |b| {
            b.iter(|| {
                MergeEngine::new(black_box(&points), config)
                    .unwrap()
                    .run()
            });
        });
    }
    let config = Config::new(Metric::Manhattan, Linkage::Average).with_goal_clusters(10);
    c.bench_function("60 uniform points, average linkage down to 10", |b| {
        b.iter(|| MergeEngine::new(black_box(&points), config).unwrap().run());
    });
}

pub fn distances(c: &mut Criterion) {
    let points = random_points(200);
    for metric in [Metric::Euclidean, Metric::SquaredEuclidean, Metric::Manhattan] {
        c.bench_function(&format!("200² {metric} distances, cached twice"), |b| {
            b.iter(|| {
                let mut cache = DistanceCache::new();
                for _ in 0..2 {
                    for p in &points {
                        for q in &points {
                            black_box(cache.distance(metric, p, q));
                        }
                    }
                }
                cache.clear();
            });
        });
    }
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = hierarchies, distances
);
criterion_main!(benches);
