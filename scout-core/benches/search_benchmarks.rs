use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scout_core::index::{FlatIndex, Ranker};
use scout_core::vector::{Embedding, DEFAULT_DIMENSIONS};

const DIM: usize = DEFAULT_DIMENSIONS;

// --- Data Generation Helper Functions ---

fn generate_unit_vector(dim: usize, rng: &mut StdRng) -> Embedding {
    let raw: Vec<f32> = (0..dim).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect();
    Embedding::from(raw)
        .normalized()
        .unwrap_or_else(|_| Embedding(Array1::from_elem(dim, 1.0 / (dim as f32).sqrt())))
}

fn generate_index(num_vectors: usize, dim: usize, seed: u64) -> FlatIndex {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(num_vectors * dim);
    for _ in 0..num_vectors {
        rows.extend(generate_unit_vector(dim, &mut rng).iter().copied());
    }
    let matrix = Array2::from_shape_vec((num_vectors, dim), rows).unwrap();
    FlatIndex::new(matrix).unwrap()
}

// --- Benchmark Functions ---

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    let seed = 7u64;

    for n_val in [1_000, 10_000, 27_000].iter() {
        let index = generate_index(*n_val, DIM, seed);
        let mut rng = StdRng::seed_from_u64(seed + 1);
        let query = generate_unit_vector(DIM, &mut rng);

        group.throughput(Throughput::Elements(*n_val as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n_val), n_val, |b, _| {
            b.iter(|| index.rank(black_box(query.view()), black_box(10)).unwrap())
        });
    }
    group.finish();
}

fn bench_rank_top_k(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_top_k");
    let index = generate_index(10_000, DIM, 11);
    let mut rng = StdRng::seed_from_u64(12);
    let query = generate_unit_vector(DIM, &mut rng);

    for k in [1usize, 10, 100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(k), k, |b, &k| {
            b.iter(|| index.rank(black_box(query.view()), black_box(k)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rank, bench_rank_top_k);
criterion_main!(benches);
