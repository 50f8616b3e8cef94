//! Pool manager: one buffer, its node list and its gap index
//!
//! Every public mutation either completes or leaves the pool untouched.
//! Anything that could fail for lack of memory (node slots, index entries,
//! the offset map) is reserved before the first structural edit.

use crate::core::{AllocationPolicy, AllocationRecord, PoolConfig};
use crate::error::{MemoryError, MemoryResult};
use crate::pool::gap_index::GapIndex;
use crate::pool::inspect::{PoolLayout, Segments};
use crate::pool::node_list::{NodeId, NodeList};
use crate::pool::stats::PoolStats;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// A bounded memory pool
///
/// # Example
/// ```
/// use mempool::prelude::*;
///
/// let mut pool = PoolManager::new(1000, AllocationPolicy::BestFit)?;
///
/// let record = pool.allocate(100)?;
/// pool.bytes_mut(record)?.fill(0xAB);
/// assert_eq!(pool.allocated_bytes(), 100);
///
/// pool.free(record)?;
/// assert!(pool.is_idle());
/// # Ok::<(), mempool::MemoryError>(())
/// ```
#[derive(Debug)]
pub struct PoolManager {
    buffer: Box<[u8]>,
    policy: AllocationPolicy,
    nodes: NodeList,
    gaps: GapIndex,
    num_allocations: usize,
    allocated_bytes: usize,
}

impl PoolManager {
    /// Open a pool of `total_size` bytes with default array growth
    pub fn new(total_size: usize, policy: AllocationPolicy) -> MemoryResult<Self> {
        Self::open(PoolConfig::new(total_size, policy))
    }

    /// Open a pool from a full configuration
    ///
    /// Partially acquired storage is released if any step fails.
    pub fn open(config: PoolConfig) -> MemoryResult<Self> {
        config.validate()?;

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(config.total_size)
            .map_err(|_| MemoryError::out_of_memory("pool buffer", config.total_size))?;
        buffer.resize(config.total_size, 0u8);

        let nodes = NodeList::new(config.total_size, config.node_storage)?;
        let mut gaps = GapIndex::new(config.gap_index)?;
        let head = nodes
            .head()
            .ok_or_else(|| MemoryError::corruption("node list", "new list has no head"))?;
        gaps.insert(config.total_size, 0, head)?;

        #[cfg(feature = "logging")]
        debug!(
            total_size = config.total_size,
            policy = %config.policy,
            "opened pool"
        );

        Ok(Self {
            buffer: buffer.into_boxed_slice(),
            policy: config.policy,
            nodes,
            gaps,
            num_allocations: 0,
            allocated_bytes: 0,
        })
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    /// Size of the backing buffer
    #[inline]
    pub fn total_size(&self) -> usize {
        self.buffer.len()
    }

    /// Fit policy
    #[inline]
    pub fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    /// Live allocations
    #[inline]
    pub fn num_allocations(&self) -> usize {
        self.num_allocations
    }

    /// Live gaps
    #[inline]
    pub fn num_gaps(&self) -> usize {
        self.gaps.len()
    }

    /// Bytes held by live allocations
    #[inline]
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    /// Bytes held by gaps
    #[inline]
    pub fn free_bytes(&self) -> usize {
        self.total_size() - self.allocated_bytes
    }

    /// Live nodes
    #[inline]
    pub fn used_nodes(&self) -> usize {
        self.nodes.used_count()
    }

    /// Node storage capacity
    #[inline]
    pub fn node_capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Gap index capacity
    #[inline]
    pub fn gap_capacity(&self) -> usize {
        self.gaps.capacity()
    }

    /// Snapshot of all counters
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total_size: self.total_size(),
            policy: self.policy,
            num_allocations: self.num_allocations,
            num_gaps: self.num_gaps(),
            allocated_bytes: self.allocated_bytes,
            free_bytes: self.free_bytes(),
            used_nodes: self.used_nodes(),
            node_capacity: self.node_capacity(),
            gap_capacity: self.gap_capacity(),
            largest_gap: self.largest_gap(),
        }
    }

    fn largest_gap(&self) -> usize {
        self.gaps.largest().map_or(0, |entry| entry.size())
    }

    /// Whether the pool is back in its freshly opened state
    pub fn is_idle(&self) -> bool {
        self.num_allocations == 0 && self.num_gaps() == 1
    }

    /// Fail with [`MemoryError::PoolNotEmpty`] unless the pool is idle
    pub fn ensure_idle(&self) -> MemoryResult<()> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(MemoryError::pool_not_empty(
                self.num_allocations,
                self.num_gaps(),
            ))
        }
    }

    // ------------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------------

    /// Carve `size` bytes out of a gap chosen by the pool's fit policy
    pub fn allocate(&mut self, size: usize) -> MemoryResult<AllocationRecord> {
        if size == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }

        let chosen = self
            .find_gap(size)
            .ok_or_else(|| MemoryError::no_suitable_gap(size, self.largest_gap()))?;
        let gap = *self.nodes.node(chosen);
        let splits = gap.size() > size;

        // Reserve up front; nothing below may fail for lack of memory
        self.nodes.reserve_for_split(splits)?;
        self.gaps.reserve_for(self.gaps.len())?;

        self.gaps.remove(gap.size(), chosen)?;
        if let Some(tail) = self.nodes.split(chosen, size)? {
            let remainder = self.nodes.node(tail).extent();
            self.gaps.insert(remainder.size(), remainder.offset(), tail)?;
        }

        self.num_allocations += 1;
        self.allocated_bytes += size;

        let record = self.nodes.node(chosen).extent();

        #[cfg(feature = "logging")]
        trace!(
            offset = record.offset(),
            size,
            gaps = self.num_gaps(),
            "allocated"
        );

        Ok(record)
    }

    fn find_gap(&self, size: usize) -> Option<NodeId> {
        if self.gaps.is_empty() {
            return None;
        }

        match self.policy {
            AllocationPolicy::FirstFit => self.nodes.first_fit(size),
            AllocationPolicy::BestFit => self.gaps.find_best_fit(size).map(|entry| entry.node()),
        }
    }

    /// Return an allocation to the pool, coalescing with adjacent gaps
    ///
    /// Unknown, foreign or already freed records are rejected with
    /// [`MemoryError::InvalidAllocation`].
    pub fn free(&mut self, record: AllocationRecord) -> MemoryResult<()> {
        let id = self
            .nodes
            .find_allocation(record)
            .ok_or_else(|| MemoryError::invalid_allocation(record))?;

        // Only an isolated free adds an index entry; merging never grows it
        let (prev, next) = self.nodes.adjacent_gaps(id);
        if prev.is_none() && next.is_none() {
            self.gaps.reserve_for(self.gaps.len() + 1)?;
        }

        for neighbor in [next, prev].into_iter().flatten() {
            let size = self.nodes.node(neighbor).size();
            self.gaps.remove(size, neighbor)?;
        }

        self.nodes.release(id);
        let survivor = self.nodes.merge_free(id);
        let merged = *self.nodes.node(survivor);
        self.gaps.insert(merged.size(), merged.offset(), survivor)?;

        self.num_allocations -= 1;
        self.allocated_bytes -= record.size();

        #[cfg(feature = "logging")]
        trace!(
            offset = record.offset(),
            size = record.size(),
            merged_size = merged.size(),
            gaps = self.num_gaps(),
            "freed"
        );

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Buffer access
    // ------------------------------------------------------------------------

    /// Bytes of a live allocation
    pub fn bytes(&self, record: AllocationRecord) -> MemoryResult<&[u8]> {
        self.nodes
            .find_allocation(record)
            .map(|_| &self.buffer[record.range()])
            .ok_or_else(|| MemoryError::invalid_allocation(record))
    }

    /// Mutable bytes of a live allocation
    pub fn bytes_mut(&mut self, record: AllocationRecord) -> MemoryResult<&mut [u8]> {
        if self.nodes.find_allocation(record).is_none() {
            return Err(MemoryError::invalid_allocation(record));
        }
        Ok(&mut self.buffer[record.range()])
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Every live node in address order as `(offset, size, allocated)`
    pub fn inspect(&self) -> Segments<'_> {
        Segments::new(self.nodes.iter())
    }

    /// Displayable layout for diagnostics
    pub fn layout(&self) -> PoolLayout<'_> {
        PoolLayout::new(self.inspect())
    }

    /// Verify every structural invariant of the pool
    ///
    /// Returns [`MemoryError::Corruption`] describing the first violation.
    pub fn check_invariants(&self) -> MemoryResult<()> {
        const LIST: &str = "node list";
        const INDEX: &str = "gap index";

        let mut expected_offset = 0;
        let mut live = 0;
        let mut gaps = 0;
        let mut allocations = 0;
        let mut allocated_bytes = 0;
        let mut prev: Option<NodeId> = None;
        let mut prev_was_gap = false;

        let mut cursor = self.nodes.head();
        while let Some(id) = cursor {
            if live >= self.nodes.slot_count() {
                return Err(MemoryError::corruption(LIST, "cycle in next links"));
            }

            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| MemoryError::corruption(LIST, "link to a missing slot"))?;
            if !node.is_live() {
                return Err(MemoryError::corruption(LIST, "link to a vacant slot"));
            }
            if node.prev() != prev {
                return Err(MemoryError::corruption(LIST, "prev link disagrees with next"));
            }
            if node.offset() != expected_offset {
                return Err(MemoryError::corruption(LIST, "extents are not contiguous"));
            }
            if node.size() == 0 {
                return Err(MemoryError::corruption(LIST, "empty extent"));
            }

            if node.is_allocated() {
                allocations += 1;
                allocated_bytes += node.size();
                if self.nodes.find_allocation(node.extent()) != Some(id) {
                    return Err(MemoryError::corruption(LIST, "allocation missing from offset map"));
                }
            } else {
                if prev_was_gap {
                    return Err(MemoryError::corruption(LIST, "adjacent gaps were not merged"));
                }
                gaps += 1;
            }

            prev_was_gap = !node.is_allocated();
            expected_offset += node.size();
            live += 1;
            prev = Some(id);
            cursor = node.next();
        }

        if expected_offset != self.total_size() {
            return Err(MemoryError::corruption(LIST, "extents do not cover the pool"));
        }
        if live != self.nodes.used_count() || live > self.nodes.capacity() {
            return Err(MemoryError::corruption(LIST, "live node count is off"));
        }
        if allocations != self.num_allocations || allocated_bytes != self.allocated_bytes {
            return Err(MemoryError::corruption(LIST, "allocation counters are off"));
        }
        if gaps != self.gaps.len() || self.gaps.len() > self.gaps.capacity() {
            return Err(MemoryError::corruption(INDEX, "gap count disagrees with node list"));
        }
        if !self.gaps.is_sorted() {
            return Err(MemoryError::corruption(INDEX, "entries are out of order"));
        }

        for entry in self.gaps.as_slice() {
            let matches = self.nodes.get(entry.node()).is_some_and(|node| {
                node.is_gap() && node.size() == entry.size() && node.offset() == entry.offset()
            });
            if !matches {
                return Err(MemoryError::corruption(INDEX, "entry does not match a live gap"));
            }
        }

        Ok(())
    }
}
