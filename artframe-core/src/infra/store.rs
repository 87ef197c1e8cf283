use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

/// Logical partition of the persistent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Image data URIs keyed by image URL. Never expire.
    Images,
    /// Small JSON values: catalog snapshot, cursor, timestamps, preferences.
    Metadata,
}

impl Partition {
    /// Every partition, in creation order.
    pub const ALL: [Partition; 2] = [Partition::Images, Partition::Metadata];

    /// Directory (and log) name of the partition.
    pub const fn dir_name(self) -> &'static str {
        match self {
            Partition::Images => "images",
            Partition::Metadata => "metadata",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Durable key-value port.
///
/// Every call is scoped to one partition and is atomic on its own; there are
/// no cross-partition or cross-key transactions. A failed write leaves the
/// previous value (if any) readable.
#[async_trait]
pub trait PersistentStore: Send + Sync + fmt::Debug {
    /// Bytes stored under `key`, `None` when absent.
    async fn read(
        &self,
        partition: Partition,
        key: &str,
    ) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn write(
        &self,
        partition: Partition,
        key: &str,
        value: &[u8],
    ) -> Result<()>;

    /// Remove every key in `partition`; the other partition is untouched.
    async fn clear(&self, partition: Partition) -> Result<()>;
}
