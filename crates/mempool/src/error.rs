//! Standalone error types for mempool
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.

use thiserror::Error;

use crate::core::AllocationRecord;

#[cfg(feature = "logging")]
use tracing::{error, warn};

// ============================================================================
// Main Error Types
// ============================================================================

/// Pool allocator errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Registry Errors ---
    #[error("Pool registry already initialized")]
    AlreadyInitialized,

    #[error("Pool registry not initialized")]
    NotInitialized,

    #[error("Pool registry still has {open} open pool(s)")]
    PoolsStillOpen { open: usize },

    #[error("Pool handle {slot}:{generation} does not refer to an open pool")]
    InvalidHandle { slot: usize, generation: u64 },

    // --- Allocation Errors ---
    #[error("Out of memory while growing {component} to {requested} element(s)")]
    OutOfMemory {
        component: &'static str,
        requested: usize,
    },

    #[error("Node storage cannot grow beyond {capacity} slot(s)")]
    OutOfNodeCapacity { capacity: usize },

    #[error("No gap can hold {requested} bytes (largest gap: {largest_gap})")]
    NoSuitableGap { requested: usize, largest_gap: usize },

    #[error("Zero-sized allocations are not supported")]
    ZeroSizedAllocation,

    #[error("No live allocation at offset {offset} with size {size}")]
    InvalidAllocation { offset: usize, size: usize },

    // --- Pool Lifecycle Errors ---
    #[error("Pool not empty: {allocations} allocation(s), {gaps} gap(s)")]
    PoolNotEmpty { allocations: usize, gaps: usize },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // --- Internal Consistency Errors ---
    #[error("Memory corruption detected in {component}: {details}")]
    Corruption { component: String, details: String },

    #[error("Index entry not found: {reason}")]
    NotFound { reason: String },
}

impl MemoryError {
    /// Check if error is retryable
    ///
    /// Only fragmentation is expected to clear up on its own once the caller
    /// frees something. Everything else is either misuse or fatal.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoSuitableGap { .. })
    }

    /// Check if error indicates a violated internal invariant
    #[must_use]
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::Corruption { .. } | Self::NotFound { .. })
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "POOL:REGISTRY:ALREADY_INIT",
            Self::NotInitialized => "POOL:REGISTRY:NOT_INIT",
            Self::PoolsStillOpen { .. } => "POOL:REGISTRY:OPEN_POOLS",
            Self::InvalidHandle { .. } => "POOL:REGISTRY:HANDLE",
            Self::OutOfMemory { .. } => "POOL:ALLOC:OOM",
            Self::OutOfNodeCapacity { .. } => "POOL:ALLOC:NODE_CAPACITY",
            Self::NoSuitableGap { .. } => "POOL:ALLOC:NO_GAP",
            Self::ZeroSizedAllocation => "POOL:ALLOC:ZERO_SIZE",
            Self::InvalidAllocation { .. } => "POOL:FREE:INVALID",
            Self::PoolNotEmpty { .. } => "POOL:CLOSE:NOT_EMPTY",
            Self::InvalidConfig { .. } => "POOL:CONFIG:INVALID",
            Self::Corruption { .. } => "POOL:SYSTEM:CORRUPTION",
            Self::NotFound { .. } => "POOL:SYSTEM:NOT_FOUND",
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create out of memory error
    pub fn out_of_memory(component: &'static str, requested: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(component, requested, "out of memory");

        Self::OutOfMemory {
            component,
            requested,
        }
    }

    /// Create node capacity exhausted error
    pub fn out_of_node_capacity(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(capacity, "node storage exhausted");

        Self::OutOfNodeCapacity { capacity }
    }

    /// Create no suitable gap error
    #[must_use]
    pub fn no_suitable_gap(requested: usize, largest_gap: usize) -> Self {
        Self::NoSuitableGap {
            requested,
            largest_gap,
        }
    }

    /// Create invalid allocation error for a rejected free
    pub fn invalid_allocation(record: AllocationRecord) -> Self {
        #[cfg(feature = "logging")]
        warn!(
            offset = record.offset(),
            size = record.size(),
            "rejected unknown allocation record"
        );

        Self::InvalidAllocation {
            offset: record.offset(),
            size: record.size(),
        }
    }

    /// Create invalid handle error
    #[must_use]
    pub fn invalid_handle(slot: usize, generation: u64) -> Self {
        Self::InvalidHandle { slot, generation }
    }

    /// Create pool not empty error
    pub fn pool_not_empty(allocations: usize, gaps: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(allocations, gaps, "refusing to close a pool that is not idle");

        Self::PoolNotEmpty { allocations, gaps }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }

    /// Create memory corruption error
    pub fn corruption(component: &str, details: &str) -> Self {
        #[cfg(feature = "logging")]
        error!("Memory corruption: {component} - {details}");

        Self::Corruption {
            component: component.to_string(),
            details: details.to_string(),
        }
    }

    /// Create index entry not found error
    pub fn not_found(reason: &str) -> Self {
        #[cfg(feature = "logging")]
        error!("Index inconsistency: {reason}");

        Self::NotFound {
            reason: reason.to_string(),
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for pool operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

/// Generic result type alias
pub type Result<T> = MemoryResult<T>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let error = MemoryError::no_suitable_gap(1024, 512);
        assert!(error.to_string().contains("1024"));
        assert!(error.to_string().contains("512"));

        let error = MemoryError::invalid_allocation(AllocationRecord::new(64, 32));
        assert!(error.to_string().contains("64"));
        assert!(error.to_string().contains("32"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            MemoryError::out_of_memory("pool buffer", 8).code(),
            "POOL:ALLOC:OOM"
        );
        assert_eq!(
            MemoryError::pool_not_empty(1, 2).code(),
            "POOL:CLOSE:NOT_EMPTY"
        );
        assert_eq!(MemoryError::NotInitialized.code(), "POOL:REGISTRY:NOT_INIT");
    }

    #[test]
    fn test_retryable() {
        assert!(MemoryError::no_suitable_gap(10, 0).is_retryable());
        assert!(!MemoryError::out_of_node_capacity(40).is_retryable());
        assert!(!MemoryError::ZeroSizedAllocation.is_retryable());
    }

    #[test]
    fn test_defects() {
        assert!(MemoryError::not_found("gap index").is_defect());
        assert!(MemoryError::corruption("node list", "cycle").is_defect());
        assert!(!MemoryError::PoolsStillOpen { open: 1 }.is_defect());
    }
}
