//! Bounded memory pools
//!
//! A [`PoolManager`] owns one fixed-size byte buffer and hands out
//! contiguous extents of it. Internally the buffer is described by an
//! address-ordered node list of allocated and free extents, plus a gap
//! index that keeps free extents sorted by size for best fit. Both stay
//! private to the crate; clients see records, segments and stats.
//!
//! ```text
//!   offset 0                                             total_size
//!   |--alloc--|---gap---|--alloc--|---------gap---------|
//!       n0        n1        n2              n3
//!
//!   gap index: [(n1.size, n1), (n3.size, n3)]   ascending size
//! ```
//!
//! The node list is not reachable from outside the crate:
//!
//! ```compile_fail
//! use mempool::pool::NodeList;
//! ```

mod gap_index;
mod inspect;
mod manager;
mod node_list;
mod stats;

pub use inspect::{PoolLayout, Segments};
pub use manager::PoolManager;
pub use stats::PoolStats;
