//! Size-ordered index over the gaps of a pool
//!
//! Entries are kept sorted by `(size, offset)`. Inserting appends and then
//! bubbles the new entry towards the front, which is a single pass because
//! everything before it is already sorted. Best fit is the left-most entry
//! whose size is sufficient. First fit does not use this index at all: it
//! walks the node list in address order.

use crate::collections::GrowableArray;
use crate::core::GrowthPolicy;
use crate::error::{MemoryError, MemoryResult};
use crate::pool::node_list::NodeId;

/// Back-reference from the index to a gap node
///
/// Valid only while the referenced node is a live gap. The offset is cached
/// so ordering never has to consult the node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GapEntry {
    size: usize,
    offset: usize,
    node: NodeId,
}

impl GapEntry {
    /// Gap size in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Gap offset in the pool buffer
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Node holding the gap
    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    fn key(&self) -> (usize, usize) {
        (self.size, self.offset)
    }
}

/// Sorted gap index
#[derive(Debug)]
pub(crate) struct GapIndex {
    entries: GrowableArray<GapEntry>,
}

impl GapIndex {
    /// Create an empty index
    pub fn new(growth: GrowthPolicy) -> MemoryResult<Self> {
        Ok(Self {
            entries: GrowableArray::with_policy("gap index", growth)?,
        })
    }

    /// Number of indexed gaps
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no gap is indexed
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Logical capacity of the index
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Entries in ascending `(size, offset)` order
    #[inline]
    pub fn as_slice(&self) -> &[GapEntry] {
        self.entries.as_slice()
    }

    /// Grow ahead of time so the index can hold `count` entries
    pub fn reserve_for(&mut self, count: usize) -> MemoryResult<()> {
        let capacity = self.entries.capacity();
        self.entries
            .ensure_capacity_for(count)
            .map_err(|_| MemoryError::out_of_node_capacity(capacity))
    }

    /// Index a gap of `size` bytes at `offset` held by `node`
    pub fn insert(&mut self, size: usize, offset: usize, node: NodeId) -> MemoryResult<()> {
        let capacity = self.entries.capacity();
        self.entries
            .push(GapEntry { size, offset, node })
            .map_err(|_| MemoryError::out_of_node_capacity(capacity))?;

        let key = (size, offset);
        let mut i = self.entries.len() - 1;
        while i > 0 && key < self.entries.as_slice()[i - 1].key() {
            self.entries.swap(i, i - 1);
            i -= 1;
        }

        Ok(())
    }

    /// Remove the entry for exactly `(size, node)`
    ///
    /// Several gaps may share a size, so the node must match too. A miss
    /// means the index and the node list disagree.
    pub fn remove(&mut self, size: usize, node: NodeId) -> MemoryResult<GapEntry> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.size == size && entry.node == node)
            .ok_or_else(|| {
                MemoryError::not_found(&format!(
                    "gap of {size} bytes at node {} is not indexed",
                    node.index()
                ))
            })?;

        self.entries.remove(position).ok_or_else(|| {
            MemoryError::corruption("gap index", "entry vanished during removal")
        })
    }

    /// Smallest gap of at least `size` bytes, lowest offset first on ties
    pub fn find_best_fit(&self, size: usize) -> Option<GapEntry> {
        let entries = self.entries.as_slice();
        let first = entries.partition_point(|entry| entry.size < size);
        entries.get(first).copied()
    }

    /// Largest indexed gap
    pub fn largest(&self) -> Option<GapEntry> {
        self.entries.as_slice().last().copied()
    }

    /// Whether entries are in ascending `(size, offset)` order
    pub fn is_sorted(&self) -> bool {
        self.entries
            .as_slice()
            .windows(2)
            .all(|pair| pair[0].key() <= pair[1].key())
    }
}
