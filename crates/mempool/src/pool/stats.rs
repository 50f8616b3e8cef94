//! Read-only pool metadata

use crate::core::AllocationPolicy;

/// Snapshot of a pool's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolStats {
    /// Size of the backing buffer
    pub total_size: usize,
    /// Fit policy
    pub policy: AllocationPolicy,
    /// Live allocations
    pub num_allocations: usize,
    /// Live gaps
    pub num_gaps: usize,
    /// Bytes held by live allocations
    pub allocated_bytes: usize,
    /// Bytes held by gaps
    pub free_bytes: usize,
    /// Live nodes
    pub used_nodes: usize,
    /// Node storage capacity
    pub node_capacity: usize,
    /// Gap index capacity
    pub gap_capacity: usize,
    /// Size of the largest gap, 0 when the pool is full
    pub largest_gap: usize,
}

impl PoolStats {
    /// Fraction of free space not reachable by a single allocation
    ///
    /// `0.0` when all free bytes form one gap (or nothing is free), and
    /// approaching `1.0` as free space splinters.
    pub fn fragmentation(&self) -> f64 {
        if self.free_bytes == 0 {
            0.0
        } else {
            1.0 - self.largest_gap as f64 / self.free_bytes as f64
        }
    }

    /// Fraction of the buffer handed out
    pub fn utilization(&self) -> f64 {
        self.allocated_bytes as f64 / self.total_size as f64
    }
}
