use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kmc::ds::{BucketSums, PrefixScan};
use rand::{rngs::StdRng, Rng, SeedableRng};

// One fixed sequence length, split into progressively flatter row shapes so
// the row-count / row-width trade shows up in the numbers.
const N: usize = 1000;
const SHAPES: [(usize, usize); 4] = [(10, 100), (20, 50), (50, 20), (100, 10)];

fn random_weights(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.gen()).collect()
}

fn valid_threshold(rng: &mut StdRng, total: f64) -> f64 {
    // Stay inside the open interval so checked builds bench the same path.
    (rng.gen::<f64>() * total).clamp(1e-12, total * 0.999_999)
}

/// One random entry changes per iteration, the bucket's best case.
fn bench_single_mutation(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_mutation");
    for (rows, cols) in SHAPES {
        let label = format!("{}x{}", rows, cols);
        group.bench_function(BenchmarkId::new("bucket", &label), |b| {
            let mut rng = StdRng::seed_from_u64(42);
            let mut weights = random_weights(&mut rng, N);
            let mut bucket = BucketSums::new(rows, cols, &weights);
            b.iter(|| {
                let ix = rng.gen_range(0..N);
                weights[ix] = rng.gen();
                bucket.update_row(&weights, ix / cols).unwrap();
                bucket.refresh_cumsums();
                let t = valid_threshold(&mut rng, bucket.total());
                black_box(bucket.find_upper_bound(&weights, t).unwrap());
            })
        });
        group.bench_function(BenchmarkId::new("naive", &label), |b| {
            let mut rng = StdRng::seed_from_u64(42);
            let mut weights = random_weights(&mut rng, N);
            let mut scan = PrefixScan::new(&weights);
            b.iter(|| {
                let ix = rng.gen_range(0..N);
                weights[ix] = rng.gen();
                scan.rebuild(&weights);
                let t = valid_threshold(&mut rng, scan.total());
                black_box(scan.find_upper_bound(t));
            })
        });
    }
    group.finish();
}

/// A burst of four consecutive entries changes, spanning at most two rows.
fn bench_local_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_burst");
    for (rows, cols) in SHAPES {
        let label = format!("{}x{}", rows, cols);
        group.bench_function(BenchmarkId::new("bucket", &label), |b| {
            let mut rng = StdRng::seed_from_u64(1337);
            let mut weights = random_weights(&mut rng, N);
            let mut bucket = BucketSums::new(rows, cols, &weights);
            b.iter(|| {
                let ix = rng.gen_range(0..N - 3);
                for j in 0..4 {
                    weights[ix + j] = rng.gen();
                }
                for row in ix / cols..=(ix + 3) / cols {
                    bucket.update_row(&weights, row).unwrap();
                }
                bucket.refresh_cumsums();
                let t = valid_threshold(&mut rng, bucket.total());
                black_box(bucket.find_upper_bound(&weights, t).unwrap());
            })
        });
        group.bench_function(BenchmarkId::new("naive", &label), |b| {
            let mut rng = StdRng::seed_from_u64(1337);
            let mut weights = random_weights(&mut rng, N);
            let mut scan = PrefixScan::new(&weights);
            b.iter(|| {
                let ix = rng.gen_range(0..N - 3);
                for j in 0..4 {
                    weights[ix + j] = rng.gen();
                }
                scan.rebuild(&weights);
                let t = valid_threshold(&mut rng, scan.total());
                black_box(scan.find_upper_bound(t));
            })
        });
    }
    group.finish();
}

/// The first entry of every row changes, the bucket's worst case: every row
/// must be re-summed and the whole cumulative array repaired.
fn bench_row_scatter(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_scatter");
    for (rows, cols) in SHAPES {
        let label = format!("{}x{}", rows, cols);
        group.bench_function(BenchmarkId::new("bucket", &label), |b| {
            let mut rng = StdRng::seed_from_u64(7);
            let mut weights = random_weights(&mut rng, N);
            let mut bucket = BucketSums::new(rows, cols, &weights);
            b.iter(|| {
                for row in 0..rows {
                    weights[row * cols] = rng.gen();
                    bucket.update_row(&weights, row).unwrap();
                }
                bucket.refresh_cumsums();
                let t = valid_threshold(&mut rng, bucket.total());
                black_box(bucket.find_upper_bound(&weights, t).unwrap());
            })
        });
        group.bench_function(BenchmarkId::new("naive", &label), |b| {
            let mut rng = StdRng::seed_from_u64(7);
            let mut weights = random_weights(&mut rng, N);
            let mut scan = PrefixScan::new(&weights);
            b.iter(|| {
                for row in 0..rows {
                    weights[row * cols] = rng.gen();
                }
                scan.rebuild(&weights);
                let t = valid_threshold(&mut rng, scan.total());
                black_box(scan.find_upper_bound(t));
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_single_mutation,
    bench_local_burst,
    bench_row_scatter
);
criterion_main!(benches);
