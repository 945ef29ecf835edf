//! LRU cache of recently resolved snapshots.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::RwLock;
use primitive_types::H256;

use crate::domain::Snapshot;

/// Bounded snapshot cache keyed by block hash.
///
/// Snapshots are held behind `Arc` so a lookup hands out a shared reference
/// without cloning the committee, and the write lock is released before any
/// signature verification runs against the result.
pub struct SnapshotCache {
    inner: RwLock<LruCache<H256, Arc<Snapshot>>>,
}

impl SnapshotCache {
    /// Cache holding at most `capacity` snapshots. A zero capacity is
    /// bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Look up the snapshot for `hash`, refreshing its recency.
    pub fn get(&self, hash: &H256) -> Option<Arc<Snapshot>> {
        self.inner.write().get(hash).cloned()
    }

    /// Insert a snapshot, evicting the least recently used entry when full.
    pub fn insert(&self, hash: H256, snapshot: Arc<Snapshot>) {
        self.inner.write().put(hash, snapshot);
    }

    /// Number of cached snapshots.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(number: u64) -> Arc<Snapshot> {
        Arc::new(Snapshot::new(
            number,
            H256::from_low_u64_be(number),
            Vec::new(),
        ))
    }

    #[test]
    fn test_capacity_eviction() {
        let cache = SnapshotCache::new(2);
        cache.insert(H256::from_low_u64_be(1), snap(1));
        cache.insert(H256::from_low_u64_be(2), snap(2));
        cache.insert(H256::from_low_u64_be(3), snap(3));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&H256::from_low_u64_be(1)).is_none());
        assert!(cache.get(&H256::from_low_u64_be(3)).is_some());
    }

    #[test]
    fn test_get_refreshes_recency() {
        let cache = SnapshotCache::new(2);
        cache.insert(H256::from_low_u64_be(1), snap(1));
        cache.insert(H256::from_low_u64_be(2), snap(2));

        // Touch 1 so 2 becomes the eviction candidate
        assert!(cache.get(&H256::from_low_u64_be(1)).is_some());
        cache.insert(H256::from_low_u64_be(3), snap(3));

        assert!(cache.get(&H256::from_low_u64_be(1)).is_some());
        assert!(cache.get(&H256::from_low_u64_be(2)).is_none());
    }
}
