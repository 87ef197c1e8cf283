use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::store::{Partition, PersistentStore};
use crate::error::Result;

/// Process-local store for ephemeral runs and tests. Nothing survives a
/// restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: Mutex<HashMap<Partition, HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held in `partition`.
    pub fn len(&self, partition: Partition) -> usize {
        self.partitions
            .lock()
            .get(&partition)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    /// `partition` holds no keys.
    pub fn is_empty(&self, partition: Partition) -> bool {
        self.len(partition) == 0
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn read(
        &self,
        partition: Partition,
        key: &str,
    ) -> Result<Option<Vec<u8>>> {
        Ok(self
            .partitions
            .lock()
            .get(&partition)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn write(
        &self,
        partition: Partition,
        key: &str,
        value: &[u8],
    ) -> Result<()> {
        self.partitions
            .lock()
            .entry(partition)
            .or_default()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn clear(&self, partition: Partition) -> Result<()> {
        self.partitions.lock().remove(&partition);
        Ok(())
    }
}
