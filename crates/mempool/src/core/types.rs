//! Common types shared by pools, the registry and their clients

use core::fmt;
use core::ops::Range;

/// Fit policy - the rule used to pick a gap for an allocation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AllocationPolicy {
    /// First fit - lowest-addressed gap that is large enough
    #[default]
    FirstFit,
    /// Best fit - smallest gap that is large enough
    BestFit,
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstFit => write!(f, "first-fit"),
            Self::BestFit => write!(f, "best-fit"),
        }
    }
}

/// One contiguous extent of a pool's buffer
///
/// Records are plain values (offset + length). Holding one never pins any
/// internal storage, so node or index growth cannot invalidate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocationRecord {
    offset: usize,
    size: usize,
}

impl AllocationRecord {
    /// Create a record for `size` bytes starting at `offset`
    #[must_use]
    pub const fn new(offset: usize, size: usize) -> Self {
        Self { offset, size }
    }

    /// Offset of the first byte inside the pool buffer
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Offset one past the last byte
    ///
    /// Saturates at `usize::MAX` for hand-built records that run past the
    /// address space; records handed out by a pool never do.
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset.saturating_add(self.size)
    }

    /// Byte range covered by this record
    #[inline]
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

/// Snapshot of one node of a pool, as reported by inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolSegment {
    /// Offset of the segment inside the pool buffer
    pub offset: usize,
    /// Segment length in bytes
    pub size: usize,
    /// `true` for an allocation, `false` for a gap
    pub allocated: bool,
}

impl PoolSegment {
    /// Shorthand used heavily in tests and diagnostics
    #[must_use]
    pub const fn new(offset: usize, size: usize, allocated: bool) -> Self {
        Self {
            offset,
            size,
            allocated,
        }
    }
}

impl fmt::Display for PoolSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.allocated { "alloc" } else { "gap" };
        write!(f, "{kind}[{}..{}]", self.offset, self.offset + self.size)
    }
}
