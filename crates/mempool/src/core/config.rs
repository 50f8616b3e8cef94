//! Configuration for pools, their internal arrays and the registry
//!
//! Every internal array grows by the same amortized rule: once the
//! occupancy it is about to reach crosses `fill_factor`, capacity is
//! multiplied by `expand_factor`. Arrays never shrink.

use crate::core::AllocationPolicy;
use crate::error::{MemoryError, MemoryResult};

/// Growth rule for one amortized-growth array
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GrowthPolicy {
    /// Capacity allocated up front
    pub initial_capacity: usize,
    /// Occupancy ratio (exclusive, 0.0-1.0) that triggers growth
    pub fill_factor: f32,
    /// Multiplier applied to capacity on growth (> 1.0)
    pub expand_factor: f32,
    /// Hard ceiling; growing past it fails as if memory ran out
    pub max_capacity: Option<usize>,
}

impl GrowthPolicy {
    /// Pool registry store
    pub const REGISTRY: Self = Self {
        initial_capacity: 20,
        fill_factor: 0.75,
        expand_factor: 2.0,
        max_capacity: None,
    };

    /// Per-pool node storage
    pub const NODE_STORAGE: Self = Self {
        initial_capacity: 40,
        fill_factor: 0.75,
        expand_factor: 2.0,
        max_capacity: None,
    };

    /// Per-pool gap index
    pub const GAP_INDEX: Self = Self {
        initial_capacity: 40,
        fill_factor: 0.75,
        expand_factor: 2.0,
        max_capacity: None,
    };

    /// Create a policy with the default factors and the given initial capacity
    #[must_use]
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..Self::NODE_STORAGE
        }
    }

    /// Set the fill factor
    #[must_use = "builder methods must be chained or built"]
    pub fn with_fill_factor(mut self, fill_factor: f32) -> Self {
        self.fill_factor = fill_factor;
        self
    }

    /// Set the expand factor
    #[must_use = "builder methods must be chained or built"]
    pub fn with_expand_factor(mut self, expand_factor: f32) -> Self {
        self.expand_factor = expand_factor;
        self
    }

    /// Cap the capacity the array may ever reach
    #[must_use = "builder methods must be chained or built"]
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = Some(max_capacity);
        self
    }

    /// Validate the policy
    pub fn validate(&self) -> MemoryResult<()> {
        if self.initial_capacity == 0 {
            return Err(MemoryError::invalid_config(
                "initial capacity must be positive",
            ));
        }

        if self.fill_factor.is_nan() || self.fill_factor <= 0.0 || self.fill_factor >= 1.0 {
            return Err(MemoryError::invalid_config(
                "fill factor must lie strictly between 0 and 1",
            ));
        }

        if !self.expand_factor.is_finite() || self.expand_factor <= 1.0 {
            return Err(MemoryError::invalid_config(
                "expand factor must be greater than 1",
            ));
        }

        if let Some(max) = self.max_capacity {
            if max < self.initial_capacity {
                return Err(MemoryError::invalid_config(
                    "max capacity is below initial capacity",
                ));
            }
        }

        Ok(())
    }

    /// Whether holding `count` elements in `capacity` slots crosses the fill factor
    #[inline]
    pub fn exceeds_fill(&self, count: usize, capacity: usize) -> bool {
        count as f64 > capacity as f64 * f64::from(self.fill_factor)
    }

    /// Capacity after one growth step from `current`
    ///
    /// Always at least `current + 1` unless clamped by `max_capacity`.
    #[must_use]
    pub fn grown_capacity(&self, current: usize) -> usize {
        let scaled = (current as f64 * f64::from(self.expand_factor)).ceil();
        let grown = if scaled >= usize::MAX as f64 {
            usize::MAX
        } else {
            (scaled as usize).max(current.saturating_add(1))
        };

        match self.max_capacity {
            Some(max) => grown.min(max).max(current),
            None => grown,
        }
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::NODE_STORAGE
    }
}

/// Configuration for a single pool
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Size of the backing buffer in bytes
    pub total_size: usize,
    /// Fit policy
    pub policy: AllocationPolicy,
    /// Growth of the node storage array
    pub node_storage: GrowthPolicy,
    /// Growth of the gap index
    pub gap_index: GrowthPolicy,
}

impl PoolConfig {
    /// Create a pool configuration with default array growth
    #[must_use]
    pub fn new(total_size: usize, policy: AllocationPolicy) -> Self {
        Self {
            total_size,
            policy,
            node_storage: GrowthPolicy::NODE_STORAGE,
            gap_index: GrowthPolicy::GAP_INDEX,
        }
    }

    /// First-fit pool of `total_size` bytes
    #[must_use]
    pub fn first_fit(total_size: usize) -> Self {
        Self::new(total_size, AllocationPolicy::FirstFit)
    }

    /// Best-fit pool of `total_size` bytes
    #[must_use]
    pub fn best_fit(total_size: usize) -> Self {
        Self::new(total_size, AllocationPolicy::BestFit)
    }

    /// Set the fit policy
    #[must_use = "builder methods must be chained or built"]
    pub fn with_policy(mut self, policy: AllocationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override node storage growth
    #[must_use = "builder methods must be chained or built"]
    pub fn with_node_storage(mut self, growth: GrowthPolicy) -> Self {
        self.node_storage = growth;
        self
    }

    /// Override gap index growth
    #[must_use = "builder methods must be chained or built"]
    pub fn with_gap_index(mut self, growth: GrowthPolicy) -> Self {
        self.gap_index = growth;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> MemoryResult<()> {
        if self.total_size == 0 {
            return Err(MemoryError::invalid_config("pool size must be positive"));
        }

        self.node_storage.validate()?;
        self.gap_index.validate()
    }
}

/// Configuration for a pool registry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegistryConfig {
    /// Growth of the pool store
    pub store: GrowthPolicy,
}

impl RegistryConfig {
    /// Override pool store growth
    #[must_use = "builder methods must be chained or built"]
    pub fn with_store(mut self, growth: GrowthPolicy) -> Self {
        self.store = growth;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> MemoryResult<()> {
        self.store.validate()
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            store: GrowthPolicy::REGISTRY,
        }
    }
}
