//! Benchmarks for index construction and neighborhood extraction.
//!
//! Hashing is linear in `samples * r * b * dim`; extraction is driven by the
//! sum of squared bucket sizes, so both are measured across `r`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kinship::hash::{BandIndex, BitSignatureMatrix, HashStore, HyperplaneFamily};
use kinship::{neighbors, Dataset, LocalitySensitiveHashing, LshParams};
use rand::prelude::*;

// === Generators ===

/// `n` samples scattered around `clusters` random directions.
fn clustered_dataset(n: usize, dim: usize, clusters: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(42);
    let centers: Vec<Vec<f32>> = (0..clusters)
        .map(|_| (0..dim).map(|_| rng.random_range(-1.0f32..1.0)).collect())
        .collect();
    let samples = (0..n).map(|i| {
        let c = i % clusters;
        let v: Vec<f32> = centers[c]
            .iter()
            .map(|x| x + rng.random_range(-0.05f32..0.05))
            .collect();
        (format!("sample{c}_{i}"), v)
    });
    Dataset::from_samples(dim, samples).unwrap()
}

// === Benchmarks ===

fn bench_hash_all_data(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_all_data");
    let dim = 64;

    for n in [1_000, 5_000] {
        let ds = clustered_dataset(n, dim, 10);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &ds, |bench, ds| {
            bench.iter(|| {
                let mut rng = StdRng::seed_from_u64(7);
                let family = HyperplaneFamily::generate(dim, 40, &mut rng).unwrap();
                black_box(HashStore::build(family, ds).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_neighborhoods");
    let ds = clustered_dataset(2_000, 32, 8);

    for r in [2, 5, 10] {
        let b = 4;
        let mut rng = StdRng::seed_from_u64(11);
        let family = HyperplaneFamily::generate(32, r * b, &mut rng).unwrap();
        let store = HashStore::build(family, &ds).unwrap();
        let matrix = BitSignatureMatrix::build(&store).unwrap();
        let index = BandIndex::build(&matrix, r, b).unwrap();

        group.bench_with_input(BenchmarkId::new("r", r), &index, |bench, index| {
            bench.iter(|| black_box(neighbors::extract_neighborhoods(index, &ds).unwrap()));
        });
    }

    group.finish();
}

fn bench_cluster_pipeline(c: &mut Criterion) {
    let ds = clustered_dataset(1_000, 16, 5);
    let params = LshParams::new(16, 6, 5)
        .with_seed(3)
        .with_expected_num_of_clusters(5);
    let lsh = LocalitySensitiveHashing::build(params, ds).unwrap();

    c.bench_function("cluster_l2_set_based", |bench| {
        bench.iter(|| {
            let seeds = lsh.neighborhood_clusters().unwrap();
            let merged = lsh.merge_with_coalescence(&seeds);
            black_box(lsh.merge_with_l2_set_based(&merged).unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_hash_all_data,
    bench_extraction,
    bench_cluster_pipeline
);
criterion_main!(benches);
