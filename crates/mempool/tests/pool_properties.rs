//! Property tests for pool allocate/free invariants.
//!
//! Random allocate/free sequences are replayed against a pool; after every
//! step the layout must still partition the buffer, gaps must be merged and
//! indexed, and the chosen gap must be the one the fit policy demands.

use mempool::prelude::*;
use proptest::prelude::*;

const POOL_SIZE: usize = 512;

#[derive(Debug, Clone)]
enum Op {
    Allocate(usize),
    // Index into the live allocations, modulo their count
    Free(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1usize..96).prop_map(Op::Allocate),
        2 => any::<usize>().prop_map(Op::Free),
    ]
}

fn policy() -> impl Strategy<Value = AllocationPolicy> {
    prop_oneof![Just(AllocationPolicy::FirstFit), Just(AllocationPolicy::BestFit)]
}

fn gaps(pool: &PoolManager) -> Vec<PoolSegment> {
    pool.inspect().filter(|s| !s.allocated).collect()
}

// Gap the policy must pick for `size`, as (offset, size)
fn expected_gap(
    policy: AllocationPolicy,
    gaps: &[PoolSegment],
    size: usize,
) -> Option<(usize, usize)> {
    let sufficient = gaps.iter().filter(|g| g.size >= size);
    let chosen = match policy {
        AllocationPolicy::FirstFit => sufficient.min_by_key(|g| g.offset),
        AllocationPolicy::BestFit => sufficient.min_by_key(|g| (g.size, g.offset)),
    };
    chosen.map(|g| (g.offset, g.size))
}

fn check_layout(pool: &PoolManager) -> Result<(), TestCaseError> {
    pool.check_invariants()
        .map_err(|err| TestCaseError::fail(err.to_string()))?;

    let segments: Vec<PoolSegment> = pool.inspect().collect();

    // contiguous partition of the buffer
    let mut expected_offset = 0;
    for segment in &segments {
        prop_assert_eq!(segment.offset, expected_offset);
        prop_assert!(segment.size > 0);
        expected_offset += segment.size;
    }
    prop_assert_eq!(expected_offset, POOL_SIZE);

    // no two neighbouring gaps
    for pair in segments.windows(2) {
        prop_assert!(pair[0].allocated || pair[1].allocated);
    }

    let gap_count = segments.iter().filter(|s| !s.allocated).count();
    let allocated: usize = segments.iter().filter(|s| s.allocated).map(|s| s.size).sum();
    prop_assert_eq!(gap_count, pool.num_gaps());
    prop_assert_eq!(allocated, pool.allocated_bytes());
    prop_assert!(pool.used_nodes() <= pool.node_capacity());
    prop_assert!(pool.num_gaps() <= pool.gap_capacity());

    Ok(())
}

fn replay(
    mut pool: PoolManager,
    ops: &[Op],
) -> Result<(PoolManager, Vec<AllocationRecord>), TestCaseError> {
    let mut live: Vec<AllocationRecord> = Vec::new();

    for op in ops {
        match *op {
            Op::Allocate(size) => {
                let before = gaps(&pool);
                let expected = expected_gap(pool.policy(), &before, size);

                match pool.allocate(size) {
                    Ok(record) => {
                        let (offset, gap_size) = expected
                            .ok_or_else(|| TestCaseError::fail("allocated without a fitting gap"))?;
                        prop_assert_eq!(record.offset(), offset);
                        prop_assert_eq!(record.size(), size);
                        prop_assert!(gap_size >= size);
                        live.push(record);
                    }
                    Err(MemoryError::NoSuitableGap { largest_gap, .. }) => {
                        prop_assert!(expected.is_none());
                        prop_assert!(largest_gap < size);
                    }
                    Err(other) => return Err(TestCaseError::fail(other.to_string())),
                }
            }
            Op::Free(index) => {
                if live.is_empty() {
                    continue;
                }
                let record = live.swap_remove(index % live.len());
                pool.free(record)
                    .map_err(|err| TestCaseError::fail(err.to_string()))?;

                // freeing twice is always rejected
                let again = pool.free(record);
                prop_assert!(
                    matches!(again, Err(MemoryError::InvalidAllocation { .. })),
                    "double free was accepted: {:?}",
                    again
                );
            }
        }

        check_layout(&pool)?;
        prop_assert_eq!(pool.num_allocations(), live.len());
    }

    Ok((pool, live))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn random_sequences_keep_pool_consistent(
        policy in policy(),
        ops in proptest::collection::vec(op(), 1..120),
    ) {
        let pool = PoolManager::new(POOL_SIZE, policy).unwrap();
        let (mut pool, live) = replay(pool, &ops)?;

        // draining everything restores the freshly opened state
        for record in live {
            pool.free(record).unwrap();
        }
        check_layout(&pool)?;
        prop_assert!(pool.is_idle());
        prop_assert_eq!(pool.inspect().count(), 1);
    }

    #[test]
    fn tiny_internal_arrays_grow_transparently(
        policy in policy(),
        ops in proptest::collection::vec(op(), 1..120),
    ) {
        let config = PoolConfig::new(POOL_SIZE, policy)
            .with_node_storage(GrowthPolicy::new(1).with_fill_factor(0.5))
            .with_gap_index(GrowthPolicy::new(1).with_fill_factor(0.5));
        let pool = PoolManager::open(config).unwrap();
        replay(pool, &ops)?;
    }

    #[test]
    fn allocate_then_free_round_trips(
        policy in policy(),
        size in 1usize..=POOL_SIZE,
    ) {
        let mut pool = PoolManager::new(POOL_SIZE, policy).unwrap();
        let record = pool.allocate(size).unwrap();
        prop_assert_eq!(record, AllocationRecord::new(0, size));

        pool.free(record).unwrap();
        prop_assert!(pool.is_idle());
        prop_assert_eq!(
            pool.inspect().collect::<Vec<_>>(),
            vec![PoolSegment::new(0, POOL_SIZE, false)]
        );
    }
}
