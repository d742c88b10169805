//! Bounded, newest-first history of serialized samples.
//!
//! [`RollingStore`] owns the capacity policy; [`MetricsStore`] backends only
//! provide list primitives with redis `LPUSH`/`LTRIM`/`LRANGE` semantics.

mod memory;
mod redis_list;
#[cfg(test)]
pub(crate) mod tests;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;

pub use self::memory::MemoryStore;
pub use self::redis_list::RedisStore;

/// Number of samples retained.
pub const HISTORY_CAPACITY: usize = 100;

#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Inserts at index 0.
    async fn push_front(&self, value: String) -> Result<(), StoreError>;

    /// Keeps only `start..=stop`.
    async fn trim(&self, start: isize, stop: isize) -> Result<(), StoreError>;

    /// Inclusive index range; negative indices count from the tail.
    async fn range(&self, start: isize, stop: isize) -> Result<Vec<String>, StoreError>;

    /// Push then trim to `capacity`. Backends with a transactional primitive
    /// should override this so readers never observe the untrimmed list.
    async fn push_front_capped(&self, value: String, capacity: usize) -> Result<(), StoreError> {
        self.push_front(value).await?;
        self.trim(0, capacity as isize - 1).await
    }
}

/// Shared handle over the configured backend.
#[derive(Clone)]
pub struct RollingStore {
    backend: Arc<dyn MetricsStore>,
    capacity: usize,
}

impl RollingStore {
    pub fn new(backend: Arc<dyn MetricsStore>) -> Self {
        RollingStore {
            backend,
            capacity: HISTORY_CAPACITY,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn append(&self, serialized: &str) -> Result<(), StoreError> {
        self.backend
            .push_front_capped(serialized.to_string(), self.capacity)
            .await
    }

    pub async fn range_query(&self, start: i64, end: i64) -> Result<Vec<String>, StoreError> {
        self.backend
            .range(clamp_index(start), clamp_index(end))
            .await
    }
}

fn clamp_index(index: i64) -> isize {
    index.clamp(isize::MIN as i64, isize::MAX as i64) as isize
}

/// Resolves redis-style inclusive `start..=stop` against a list of `len`.
/// `None` means the range selects nothing.
pub(crate) fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}
