//! Amortized-growth array
//!
//! `GrowableArray` keeps its own logical capacity instead of relying on
//! `Vec`'s doubling, so growth happens exactly when the configured
//! [`GrowthPolicy`] says it should and allocation failure surfaces as an
//! error instead of an abort. Elements are addressed by index only; the
//! backing storage may move on growth.

use crate::core::GrowthPolicy;
use crate::error::{MemoryError, MemoryResult};

#[cfg(feature = "logging")]
use tracing::debug;

/// Vector that grows by a fill-factor/expand-factor rule and never shrinks
#[derive(Debug, Clone)]
pub struct GrowableArray<T> {
    items: Vec<T>,
    capacity: usize,
    policy: GrowthPolicy,
    label: &'static str,
}

impl<T> GrowableArray<T> {
    /// Create an empty array holding `policy.initial_capacity` slots
    ///
    /// `label` names the array in errors and log events.
    pub fn with_policy(label: &'static str, policy: GrowthPolicy) -> MemoryResult<Self> {
        policy.validate()?;

        let mut items = Vec::new();
        items
            .try_reserve_exact(policy.initial_capacity)
            .map_err(|_| MemoryError::out_of_memory(label, policy.initial_capacity))?;

        Ok(Self {
            items,
            capacity: policy.initial_capacity,
            policy,
            label,
        })
    }

    /// Grow, if the policy requires it, so that `next_count` elements fit
    ///
    /// Nothing changes on failure.
    pub fn ensure_capacity_for(&mut self, next_count: usize) -> MemoryResult<()> {
        let mut target = self.capacity;
        while self.policy.exceeds_fill(next_count, target) {
            let grown = self.policy.grown_capacity(target);
            if grown == target {
                break;
            }
            target = grown;
        }

        if next_count > target {
            return Err(MemoryError::out_of_memory(self.label, next_count));
        }

        if target > self.capacity {
            self.items
                .try_reserve_exact(target - self.items.len())
                .map_err(|_| MemoryError::out_of_memory(self.label, target))?;

            #[cfg(feature = "logging")]
            debug!(
                array = self.label,
                from = self.capacity,
                to = target,
                "expanded array"
            );

            self.capacity = target;
        }

        Ok(())
    }

    /// Append an element, growing first if needed
    pub fn push(&mut self, value: T) -> MemoryResult<()> {
        self.ensure_capacity_for(self.items.len() + 1)?;
        self.items.push(value);
        Ok(())
    }

    /// Remove the element at `index`, shifting later elements left by one
    pub fn remove(&mut self, index: usize) -> Option<T> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Swap two elements
    #[inline]
    pub fn swap(&mut self, a: usize, b: usize) {
        self.items.swap(a, b);
    }

    /// Get element by index
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Get mutable element by index
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// Number of stored elements
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the array holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Logical capacity granted by the growth policy
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Growth policy in effect
    #[inline]
    pub fn policy(&self) -> &GrowthPolicy {
        &self.policy
    }

    /// Stored elements in index order
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Mutable view of the stored elements
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Iterate over stored elements
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a GrowableArray<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
