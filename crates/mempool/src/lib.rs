//! # mempool
//!
//! Bounded, explicitly sized memory pools with first-fit and best-fit
//! sub-allocation.
//!
//! Each pool owns one byte buffer and partitions it into allocated extents
//! and gaps. Freed extents are always coalesced with their neighbours, so a
//! pool that has everything freed returns to a single gap.
//!
//! ## Quick Start
//!
//! ```rust
//! use mempool::prelude::*;
//!
//! let mut pool = PoolManager::new(1000, AllocationPolicy::BestFit)?;
//!
//! let first = pool.allocate(100)?;
//! let _second = pool.allocate(200)?;
//! pool.free(first)?;
//!
//! // best fit reuses the 100-byte hole
//! let third = pool.allocate(50)?;
//! assert_eq!(third.offset(), 0);
//! assert_eq!(pool.num_gaps(), 2);
//!
//! println!("{}", pool.layout());
//! # Ok::<(), MemoryError>(())
//! ```
//!
//! ## Features
//!
//! - `logging` (default): structured events through `tracing`
//! - `serde`: `Serialize`/`Deserialize` for records, stats and configuration
//!
//! ## Architecture
//!
//! - Standalone error handling via the [`error`] module
//! - [`core`](crate::core): records, fit policies and configuration
//! - [`collections`]: the amortized-growth array behind every internal table
//! - [`pool`]: node list, gap index and the [`PoolManager`] built on them
//! - [`registry`]: caller-owned table of open pools addressed by handle
//!
//! Pools are single-threaded. Share one across threads only behind a lock.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(clippy::all)]
#![warn(clippy::perf)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// Precision loss in usize -> f64 casts is acceptable for stats and growth factors
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::double_must_use)]
#![allow(clippy::return_self_not_must_use)]

// Error types
pub mod error;

// Core modules
pub mod collections;
pub mod core;
pub mod pool;
pub mod registry;

// Re-export core types for convenience
pub use crate::core::{
    AllocationPolicy, AllocationRecord, GrowthPolicy, PoolConfig, PoolSegment, RegistryConfig,
};
pub use crate::error::{MemoryError, MemoryResult, Result};
pub use crate::pool::{PoolLayout, PoolManager, PoolStats, Segments};
pub use crate::registry::{PoolHandle, PoolRegistry};

// Public API exports
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    // Core types
    pub use crate::core::{
        AllocationPolicy, AllocationRecord, GrowthPolicy, PoolConfig, PoolSegment, RegistryConfig,
    };

    // Error types
    pub use crate::error::{MemoryError, MemoryResult};

    // Pools
    pub use crate::pool::{PoolManager, PoolStats};
    pub use crate::registry::{PoolHandle, PoolRegistry};
}
