//! In-memory key-value store, for tests and single-process deployments.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::ConsensusResult;
use crate::ports::outbound::KeyValueStore;

/// Thread-safe map-backed [`KeyValueStore`]. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> ConsensusResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> ConsensusResult<()> {
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_overwrite() {
        let store = MemoryStore::new();
        assert!(store.get(b"k").unwrap().is_none());

        store.put(b"k", b"v1").unwrap();
        assert_eq!(store.get(b"k").unwrap().as_deref(), Some(&b"v1"[..]));

        store.put(b"k", b"v2").unwrap();
        assert_eq!(store.get(b"k").unwrap().as_deref(), Some(&b"v2"[..]));
        assert_eq!(store.len(), 1);
    }
}
