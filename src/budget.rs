//! Memory accounting for growable working buffers.
//!
//! Every buffer whose size depends on the input charges the budget *before*
//! it grows, so pathological inputs fail with `ResourceExhausted` instead of
//! allocating without bound.

use crate::error::BuildError;

/// Tracks the bytes held by the working buffers of one operation call.
#[derive(Debug, Clone, Default)]
pub struct MemoryBudget {
    limit: Option<usize>,
    usage: usize,
    max_usage: usize,
}

impl MemoryBudget {
    /// A budget with no limit (usage is still tracked).
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    #[inline]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    #[inline]
    pub fn usage(&self) -> usize {
        self.usage
    }

    /// Peak usage seen so far.
    #[inline]
    pub fn max_usage(&self) -> usize {
        self.max_usage
    }

    /// Charge (or, with a negative delta, release) `delta` bytes.
    pub fn tally(&mut self, delta: isize) -> Result<(), BuildError> {
        let usage = if delta >= 0 {
            self.usage.saturating_add(delta as usize)
        } else {
            self.usage.saturating_sub(delta.unsigned_abs())
        };
        if let Some(limit) = self.limit {
            if usage > limit {
                return Err(BuildError::ResourceExhausted {
                    requested: usage,
                    limit,
                });
            }
        }
        self.usage = usage;
        self.max_usage = self.max_usage.max(usage);
        Ok(())
    }

    /// Charge the cost of `additional` more elements of `T`.
    #[inline]
    pub fn add<T>(&mut self, additional: usize) -> Result<(), BuildError> {
        let bytes = additional.saturating_mul(std::mem::size_of::<T>());
        self.tally(isize::try_from(bytes).unwrap_or(isize::MAX))
    }

    /// Charge for `v` growing to hold `additional` more elements, using the
    /// vector's actual capacity growth (amortized doubling). Reserves the
    /// space so that the next pushes do not reallocate.
    pub fn reserve<T>(&mut self, v: &mut Vec<T>, additional: usize) -> Result<(), BuildError> {
        let needed = v.len().saturating_add(additional);
        if needed <= v.capacity() {
            return Ok(());
        }
        let new_capacity = needed.max(v.capacity().saturating_mul(2)).max(4);
        self.add::<T>(new_capacity - v.capacity())?;
        v.reserve_exact(new_capacity - v.len());
        Ok(())
    }

    /// Push one element, charging for any reallocation first.
    #[inline]
    pub fn push<T>(&mut self, v: &mut Vec<T>, value: T) -> Result<(), BuildError> {
        self.reserve(v, 1)?;
        v.push(value);
        Ok(())
    }

    /// Release the capacity of `v` and clear it.
    pub fn release<T>(&mut self, v: &mut Vec<T>) {
        let bytes = v.capacity().saturating_mul(std::mem::size_of::<T>());
        // Releasing never fails.
        let _ = self.tally(-(isize::try_from(bytes).unwrap_or(isize::MAX)));
        *v = Vec::new();
    }
}
