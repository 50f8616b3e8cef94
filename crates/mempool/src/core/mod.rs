//! Core functionality for mempool
//!
//! This module contains the building blocks shared by every pool:
//! - Extent records and fit policies
//! - Configuration structures for pools, their arrays and the registry

pub mod config;
pub mod types;

pub use config::{GrowthPolicy, PoolConfig, RegistryConfig};
pub use types::*;
