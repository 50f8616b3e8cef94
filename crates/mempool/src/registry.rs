//! Pool registry
//!
//! Maps opaque [`PoolHandle`]s to open [`PoolManager`]s. The registry is an
//! ordinary value owned by the caller, so independent registries can
//! coexist (one per test, one per subsystem, ...).
//!
//! Handles carry a generation. Closing a pool bumps its slot's generation,
//! so a handle kept past `close` is rejected instead of silently reaching
//! whatever pool reuses the slot later.

use core::fmt;

use crate::collections::GrowableArray;
use crate::core::{AllocationPolicy, AllocationRecord, PoolConfig, RegistryConfig};
use crate::error::{MemoryError, MemoryResult};
use crate::pool::{PoolManager, PoolStats, Segments};

#[cfg(feature = "logging")]
use tracing::debug;

/// Opaque reference to a pool owned by a [`PoolRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolHandle {
    slot: usize,
    generation: u64,
}

impl PoolHandle {
    /// Slot in the registry store
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Generation of the slot when the pool was opened
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Display for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}:{}", self.slot, self.generation)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    manager: Option<PoolManager>,
}

/// Table of open pools
///
/// # Example
/// ```
/// use mempool::prelude::*;
///
/// let mut registry = PoolRegistry::new();
/// registry.init()?;
///
/// let pool = registry.open(4096, AllocationPolicy::FirstFit)?;
/// let record = registry.allocate(pool, 128)?;
/// registry.free(pool, record)?;
///
/// registry.close(pool)?;
/// registry.teardown()?;
/// # Ok::<(), mempool::MemoryError>(())
/// ```
#[derive(Debug)]
pub struct PoolRegistry {
    config: RegistryConfig,
    store: Option<GrowableArray<Slot>>,
    open_pools: usize,
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolRegistry {
    /// Create an uninitialized registry with the default store growth
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an uninitialized registry
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            store: None,
            open_pools: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Allocate the pool store
    pub fn init(&mut self) -> MemoryResult<()> {
        if self.store.is_some() {
            return Err(MemoryError::AlreadyInitialized);
        }

        self.config.validate()?;
        self.store = Some(GrowableArray::with_policy("pool registry", self.config.store)?);

        #[cfg(feature = "logging")]
        debug!(
            capacity = self.config.store.initial_capacity,
            "initialized pool registry"
        );

        Ok(())
    }

    /// Release the pool store
    ///
    /// Every pool must have been closed first.
    pub fn teardown(&mut self) -> MemoryResult<()> {
        if self.store.is_none() {
            return Err(MemoryError::NotInitialized);
        }
        if self.open_pools > 0 {
            return Err(MemoryError::PoolsStillOpen {
                open: self.open_pools,
            });
        }

        self.store = None;

        #[cfg(feature = "logging")]
        debug!("tore down pool registry");

        Ok(())
    }

    /// Whether [`init`](Self::init) has run without a later teardown
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    /// Number of pools opened and not yet closed
    #[inline]
    pub fn open_pools(&self) -> usize {
        self.open_pools
    }

    // ------------------------------------------------------------------------
    // Pools
    // ------------------------------------------------------------------------

    /// Open a pool of `total_size` bytes
    pub fn open(&mut self, total_size: usize, policy: AllocationPolicy) -> MemoryResult<PoolHandle> {
        self.open_with_config(PoolConfig::new(total_size, policy))
    }

    /// Open a pool from a full configuration
    pub fn open_with_config(&mut self, config: PoolConfig) -> MemoryResult<PoolHandle> {
        if self.store.is_none() {
            return Err(MemoryError::NotInitialized);
        }

        let manager = PoolManager::open(config)?;
        let handle = self.register(manager)?;

        #[cfg(feature = "logging")]
        debug!(%handle, open_pools = self.open_pools, "registered pool");

        Ok(handle)
    }

    /// Close an idle pool and release its buffer
    ///
    /// Fails with [`MemoryError::PoolNotEmpty`] while the pool has live
    /// allocations; the pool stays open in that case.
    pub fn close(&mut self, handle: PoolHandle) -> MemoryResult<()> {
        self.pool(handle)?.ensure_idle()?;
        let manager = self.unregister(handle)?;

        #[cfg(feature = "logging")]
        debug!(
            %handle,
            total_size = manager.total_size(),
            open_pools = self.open_pools,
            "closed pool"
        );

        drop(manager);
        Ok(())
    }

    /// Read-only access to an open pool
    pub fn pool(&self, handle: PoolHandle) -> MemoryResult<&PoolManager> {
        self.store
            .as_ref()
            .and_then(|store| store.get(handle.slot))
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.manager.as_ref())
            .ok_or_else(|| MemoryError::invalid_handle(handle.slot, handle.generation))
    }

    /// Mutable access to an open pool
    pub fn pool_mut(&mut self, handle: PoolHandle) -> MemoryResult<&mut PoolManager> {
        self.store
            .as_mut()
            .and_then(|store| store.get_mut(handle.slot))
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.manager.as_mut())
            .ok_or_else(|| MemoryError::invalid_handle(handle.slot, handle.generation))
    }

    /// Allocate from the pool behind `handle`
    pub fn allocate(&mut self, handle: PoolHandle, size: usize) -> MemoryResult<AllocationRecord> {
        self.pool_mut(handle)?.allocate(size)
    }

    /// Free into the pool behind `handle`
    pub fn free(&mut self, handle: PoolHandle, record: AllocationRecord) -> MemoryResult<()> {
        self.pool_mut(handle)?.free(record)
    }

    /// Segments of the pool behind `handle`
    pub fn inspect(&self, handle: PoolHandle) -> MemoryResult<Segments<'_>> {
        Ok(self.pool(handle)?.inspect())
    }

    /// Statistics of the pool behind `handle`
    pub fn stats(&self, handle: PoolHandle) -> MemoryResult<PoolStats> {
        Ok(self.pool(handle)?.stats())
    }

    /// Handles of all open pools in slot order
    pub fn handles(&self) -> impl Iterator<Item = PoolHandle> + '_ {
        self.store
            .iter()
            .flat_map(|store| store.iter().enumerate())
            .filter(|(_, slot)| slot.manager.is_some())
            .map(|(index, slot)| PoolHandle {
                slot: index,
                generation: slot.generation,
            })
    }

    // Reuses the lowest vacant slot before growing the store.
    fn register(&mut self, manager: PoolManager) -> MemoryResult<PoolHandle> {
        let store = self.store.as_mut().ok_or(MemoryError::NotInitialized)?;

        let vacant = store.iter().position(|slot| slot.manager.is_none());
        let handle = match vacant {
            Some(index) => {
                let slot = store.get_mut(index).ok_or_else(|| {
                    MemoryError::corruption("pool registry", "vacant slot vanished")
                })?;
                slot.manager = Some(manager);
                PoolHandle {
                    slot: index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = store.len();
                store.push(Slot {
                    generation: 0,
                    manager: Some(manager),
                })?;
                PoolHandle {
                    slot: index,
                    generation: 0,
                }
            }
        };

        self.open_pools += 1;
        Ok(handle)
    }

    fn unregister(&mut self, handle: PoolHandle) -> MemoryResult<PoolManager> {
        let slot = self
            .store
            .as_mut()
            .and_then(|store| store.get_mut(handle.slot))
            .filter(|slot| slot.generation == handle.generation)
            .ok_or_else(|| MemoryError::invalid_handle(handle.slot, handle.generation))?;

        let manager = slot
            .manager
            .take()
            .ok_or_else(|| MemoryError::invalid_handle(handle.slot, handle.generation))?;
        slot.generation = slot.generation.wrapping_add(1);

        self.open_pools -= 1;
        Ok(manager)
    }
}
