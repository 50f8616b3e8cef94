//! Registry lifecycle and end-to-end pool scenarios.

use mempool::prelude::*;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

#[fixture]
fn registry() -> PoolRegistry {
    let mut registry = PoolRegistry::new();
    registry.init().unwrap();
    registry
}

fn sizes(registry: &PoolRegistry, pool: PoolHandle) -> Vec<(usize, bool)> {
    registry
        .inspect(pool)
        .unwrap()
        .map(|s| (s.size, s.allocated))
        .collect()
}

#[rstest]
fn best_fit_reuses_freed_hole(mut registry: PoolRegistry) {
    let pool = registry.open(1000, AllocationPolicy::BestFit).unwrap();

    let first = registry.allocate(pool, 100).unwrap();
    let _second = registry.allocate(pool, 200).unwrap();
    registry.free(pool, first).unwrap();
    let third = registry.allocate(pool, 50).unwrap();

    assert_eq!(third.offset(), first.offset());
    assert_eq!(
        sizes(&registry, pool),
        vec![(50, true), (50, false), (200, true), (700, false)]
    );

    let stats = registry.stats(pool).unwrap();
    assert_eq!(stats.num_gaps, 2);
    assert_eq!(stats.num_allocations, 2);
    assert_eq!(stats.allocated_bytes, 250);
}

#[rstest]
fn first_fit_prefers_lower_address(mut registry: PoolRegistry) {
    let pool = registry.open(1000, AllocationPolicy::FirstFit).unwrap();

    let a = registry.allocate(pool, 300).unwrap();
    let _b = registry.allocate(pool, 100).unwrap();
    let c = registry.allocate(pool, 100).unwrap();
    let _d = registry.allocate(pool, 100).unwrap();
    registry.free(pool, a).unwrap();
    registry.free(pool, c).unwrap();

    assert_eq!(registry.allocate(pool, 80).unwrap().offset(), 0);
}

#[rstest]
#[case::first_fit(AllocationPolicy::FirstFit)]
#[case::best_fit(AllocationPolicy::BestFit)]
fn round_trip_restores_idle_state(mut registry: PoolRegistry, #[case] policy: AllocationPolicy) {
    let pool = registry.open(4096, policy).unwrap();

    let record = registry.allocate(pool, 1234).unwrap();
    registry.free(pool, record).unwrap();

    assert_eq!(sizes(&registry, pool), vec![(4096, false)]);
    assert!(registry.pool(pool).unwrap().is_idle());
    registry.close(pool).unwrap();
}

#[rstest]
#[case::first_fit(AllocationPolicy::FirstFit)]
#[case::best_fit(AllocationPolicy::BestFit)]
fn double_free_is_rejected(mut registry: PoolRegistry, #[case] policy: AllocationPolicy) {
    let pool = registry.open(256, policy).unwrap();
    let record = registry.allocate(pool, 32).unwrap();

    registry.free(pool, record).unwrap();
    let err = registry.free(pool, record).unwrap_err();

    assert_eq!(err, MemoryError::InvalidAllocation { offset: 0, size: 32 });
    assert_eq!(err.code(), "POOL:FREE:INVALID");
}

#[rstest]
#[case::first_fit(AllocationPolicy::FirstFit)]
#[case::best_fit(AllocationPolicy::BestFit)]
fn node_storage_grows_past_initial_capacity(
    mut registry: PoolRegistry,
    #[case] policy: AllocationPolicy,
) {
    let pool = registry.open(64, policy).unwrap();
    let initial = registry.stats(pool).unwrap().node_capacity;
    assert_eq!(initial, 40);

    let records: Vec<_> = (0..41)
        .map(|_| registry.allocate(pool, 1).unwrap())
        .collect();

    let stats = registry.stats(pool).unwrap();
    assert!(stats.node_capacity > initial);
    assert_eq!(stats.used_nodes, 42);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(*record, AllocationRecord::new(i, 1));
    }

    let segments: Vec<_> = registry.inspect(pool).unwrap().collect();
    assert_eq!(segments.last(), Some(&PoolSegment::new(41, 23, false)));
    registry.pool(pool).unwrap().check_invariants().unwrap();
}

#[rstest]
fn close_guard_and_stale_handles(mut registry: PoolRegistry) {
    let pool = registry.open(128, AllocationPolicy::FirstFit).unwrap();
    let a = registry.allocate(pool, 16).unwrap();
    let b = registry.allocate(pool, 16).unwrap();

    // one allocation left and two gaps
    registry.free(pool, a).unwrap();
    assert_eq!(
        registry.close(pool),
        Err(MemoryError::PoolNotEmpty {
            allocations: 1,
            gaps: 2
        })
    );

    registry.free(pool, b).unwrap();
    registry.close(pool).unwrap();

    assert!(matches!(
        registry.allocate(pool, 1),
        Err(MemoryError::InvalidHandle { .. })
    ));
    assert!(matches!(
        registry.inspect(pool),
        Err(MemoryError::InvalidHandle { .. })
    ));
}

#[rstest]
fn teardown_requires_every_pool_closed(mut registry: PoolRegistry) {
    let a = registry.open(64, AllocationPolicy::FirstFit).unwrap();
    let b = registry.open(64, AllocationPolicy::BestFit).unwrap();

    assert_eq!(
        registry.teardown(),
        Err(MemoryError::PoolsStillOpen { open: 2 })
    );

    registry.close(a).unwrap();
    assert_eq!(
        registry.teardown(),
        Err(MemoryError::PoolsStillOpen { open: 1 })
    );

    registry.close(b).unwrap();
    registry.teardown().unwrap();
    assert_eq!(registry.teardown(), Err(MemoryError::NotInitialized));
}

#[rstest]
fn capped_node_storage_fails_atomically(mut registry: PoolRegistry) {
    let config = PoolConfig::best_fit(100)
        .with_node_storage(GrowthPolicy::new(2).with_max_capacity(2));
    let pool = registry.open_with_config(config).unwrap();

    registry.allocate(pool, 10).unwrap();
    let before = registry.stats(pool).unwrap();

    let err = registry.allocate(pool, 10).unwrap_err();
    assert_eq!(err, MemoryError::OutOfNodeCapacity { capacity: 2 });
    assert!(!err.is_retryable());
    assert_eq!(registry.stats(pool).unwrap(), before);
}

#[rstest]
fn buffers_are_isolated_per_allocation(mut registry: PoolRegistry) {
    let pool = registry.open(64, AllocationPolicy::FirstFit).unwrap();
    let a = registry.allocate(pool, 4).unwrap();
    let b = registry.allocate(pool, 4).unwrap();

    let manager = registry.pool_mut(pool).unwrap();
    manager.bytes_mut(a).unwrap().copy_from_slice(&[1, 2, 3, 4]);
    manager.bytes_mut(b).unwrap().copy_from_slice(&[5, 6, 7, 8]);

    assert_eq!(manager.bytes(a).unwrap(), &[1, 2, 3, 4]);
    assert_eq!(manager.bytes(b).unwrap(), &[5, 6, 7, 8]);
}
