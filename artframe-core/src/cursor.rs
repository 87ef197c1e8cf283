use tracing::{debug, warn};

use crate::{
    error::{AssetError, Result},
    infra::{CursorKey, MetadataStore},
    prefetch::Prefetcher,
};

/// Stored value for "not yet positioned".
pub const UNSET: i64 = -1;

/// Persisted position in the catalog with wraparound navigation.
///
/// Every method takes the current catalog length; the cursor itself never
/// reads the catalog. Moves persist the new position before returning and
/// kick off a detached prefetch from it.
#[derive(Debug, Clone)]
pub struct Cursor {
    metadata: MetadataStore,
    prefetcher: Prefetcher,
}

impl Cursor {
    /// Cursor persisted in `metadata`; moves warm ahead through `prefetcher`.
    pub fn new(metadata: MetadataStore, prefetcher: Prefetcher) -> Self {
        Self {
            metadata,
            prefetcher,
        }
    }

    /// Current position, or `None` when the catalog is empty. An unset
    /// cursor reads as 0.
    pub async fn current(&self, len: usize) -> Result<Option<usize>> {
        if len == 0 {
            return Ok(None);
        }
        Ok(Some(self.stored(len).await?.unwrap_or(0)))
    }

    /// Step forward one entry, wrapping at `len`. An unset cursor lands on 0.
    pub async fn advance(&self, len: usize) -> Result<usize> {
        let from = match self.stored(len).await? {
            Some(index) => to_i64(index),
            None => UNSET,
        };
        self.move_to(step(from, 1, len)?, len).await
    }

    /// Step back one entry, wrapping to `len - 1` from 0.
    pub async fn retreat(&self, len: usize) -> Result<usize> {
        let from = to_i64(self.stored(len).await?.unwrap_or(0));
        self.move_to(step(from, -1, len)?, len).await
    }

    /// Jump to `index`, which must lie in `[0, len)`.
    pub async fn set_to(&self, index: i64, len: usize) -> Result<usize> {
        let index = validate(index, len)?;
        self.move_to(index, len).await
    }

    async fn move_to(&self, index: usize, len: usize) -> Result<usize> {
        self.metadata.put::<CursorKey>(&to_i64(index)).await?;
        debug!("cursor moved to {} of {}", index, len);
        // Detached: the caller never waits on look-ahead.
        drop(self.prefetcher.spawn(index));
        Ok(index)
    }

    /// Stored position normalized into `[0, len)`, `None` when unset.
    async fn stored(&self, len: usize) -> Result<Option<usize>> {
        let raw = match self.metadata.get::<CursorKey>().await {
            Ok(raw) => raw,
            Err(AssetError::Serialization(msg)) => {
                warn!("cursor value unreadable, treating as unset: {}", msg);
                None
            }
            Err(err) => return Err(err),
        };
        Ok(normalize(raw, len))
    }
}

fn normalize(raw: Option<i64>, len: usize) -> Option<usize> {
    let raw = raw.filter(|value| *value >= 0)?;
    if len == 0 {
        return None;
    }
    usize::try_from(raw.rem_euclid(to_i64(len))).ok()
}

fn step(from: i64, delta: i64, len: usize) -> Result<usize> {
    if len == 0 {
        return Err(AssetError::InvalidIndex { index: from, len });
    }
    let next = (from + delta).rem_euclid(to_i64(len));
    usize::try_from(next).map_err(|_| AssetError::InvalidIndex {
        index: next,
        len,
    })
}

fn validate(index: i64, len: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < len)
        .ok_or(AssetError::InvalidIndex { index, len })
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
