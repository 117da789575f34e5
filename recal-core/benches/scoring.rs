//! Parallel top-k scoring benchmarks
//!
//! Run with: cargo bench -p recal-core --bench scoring

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use recal_core::{Dataset, SparseVector, WeightVector, score_top_k};

const DIMENSIONS: u32 = 4096;
const FEATURES_PER_DOC: usize = 32;

fn generate_corpus(num_docs: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(7);
    let vectors = (0..num_docs)
        .map(|i| {
            let features = (0..FEATURES_PER_DOC)
                .map(|_| (rng.gen_range(0..DIMENSIONS), rng.gen_range(0.0..1.0f32)))
                .collect();
            SparseVector::from_features(i.to_string(), 0.0, features)
        })
        .collect();
    Dataset::new(vectors).expect("non-empty corpus")
}

fn generate_weights() -> WeightVector {
    let mut rng = StdRng::seed_from_u64(11);
    let features = (0..DIMENSIONS as usize / 4)
        .map(|_| (rng.gen_range(0..DIMENSIONS), rng.gen_range(-1.0..1.0f32)))
        .collect();
    let basis = SparseVector::from_features("w", 0.0, features);
    let mut w = WeightVector::new(DIMENSIONS as usize);
    w.add_vector(&basis, 1.0);
    w
}

fn bench_score_top_k(c: &mut Criterion) {
    let corpus = generate_corpus(100_000);
    let w = generate_weights();

    let mut group = c.benchmark_group("score_top_k");
    group.throughput(Throughput::Elements(corpus.size() as u64));
    for threads in [1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            &threads,
            |b, &threads| {
                b.iter(|| score_top_k(black_box(&corpus), &w, 100, threads, |_| false))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_score_top_k);
criterion_main!(benches);
