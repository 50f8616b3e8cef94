//! Pool benchmarks
//!
//! Compares first fit and best fit across allocation patterns

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use mempool::{AllocationPolicy, AllocationRecord, PoolManager};
use std::hint::black_box;

const POLICIES: [AllocationPolicy; 2] = [AllocationPolicy::FirstFit, AllocationPolicy::BestFit];

/// Benchmark single allocate/free cycle
fn bench_single_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_allocation");

    for policy in POLICIES {
        group.bench_function(format!("{policy}_64b"), |b| {
            let mut pool = PoolManager::new(1024 * 1024, policy).unwrap();

            b.iter(|| {
                let record = pool.allocate(black_box(64)).unwrap();
                pool.free(record).unwrap();
                black_box(record);
            });
        });
    }

    group.finish();
}

/// Benchmark batch allocations followed by a full drain
fn bench_batch_allocations(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_allocations");
    group.throughput(Throughput::Elements(100));

    for policy in POLICIES {
        group.bench_function(format!("{policy}_100x64b"), |b| {
            let mut pool = PoolManager::new(1024 * 1024, policy).unwrap();

            b.iter(|| {
                let mut records = Vec::with_capacity(100);
                for _ in 0..100 {
                    records.push(pool.allocate(64).unwrap());
                }
                for record in records {
                    pool.free(record).unwrap();
                }
            });
        });
    }

    group.finish();
}

/// Benchmark allocation in a fragmented pool
///
/// Every other block is freed first, so each request has to search a
/// populated gap index (best fit) or a long node list (first fit).
fn bench_fragmented(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragmented");

    for holes in [16usize, 128, 1024] {
        for policy in POLICIES {
            group.bench_with_input(BenchmarkId::new(policy.to_string(), holes), &holes, |b, &holes| {
                let mut pool = PoolManager::new(holes * 2 * 128 + 4096, policy).unwrap();
                let blocks: Vec<AllocationRecord> =
                    (0..holes * 2).map(|_| pool.allocate(128).unwrap()).collect();
                for record in blocks.iter().step_by(2) {
                    pool.free(*record).unwrap();
                }

                b.iter(|| {
                    let record = pool.allocate(black_box(96)).unwrap();
                    pool.free(record).unwrap();
                });
            });
        }
    }

    group.finish();
}

/// Benchmark mixed sizes with interleaved frees
fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");
    let sizes: Vec<usize> = (0..256).map(|i| 16 + (i * 37) % 480).collect();

    for policy in POLICIES {
        group.bench_function(policy.to_string(), |b| {
            let mut pool = PoolManager::new(1024 * 1024, policy).unwrap();

            b.iter(|| {
                let mut live: Vec<AllocationRecord> = Vec::with_capacity(sizes.len());
                for (i, size) in sizes.iter().enumerate() {
                    live.push(pool.allocate(*size).unwrap());
                    if i % 3 == 2 {
                        let record = live.swap_remove(i % live.len());
                        pool.free(record).unwrap();
                    }
                }
                for record in live {
                    pool.free(record).unwrap();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_allocation,
    bench_batch_allocations,
    bench_fragmented,
    bench_churn
);
criterion_main!(benches);
