//! One explicit schema per persisted key.
//!
//! The store itself only sees bytes. Everything above it goes through the
//! typed handles here, so a value written by an older catalog version that no
//! longer decodes shows up as [`AssetError::Serialization`] instead of leaking
//! an arbitrary shape into the pipeline.

use std::sync::Arc;

use artframe_model::{Catalog, UpdateFrequency};
use serde::{Serialize, de::DeserializeOwned};

use super::store::{Partition, PersistentStore};
use crate::error::{AssetError, Result};

/// A key in the `metadata` partition together with the type stored under it.
pub trait MetadataKey {
    /// Key under which the value is stored.
    const NAME: &'static str;
    /// JSON-encoded value type.
    type Value: Serialize + DeserializeOwned + Send + Sync;
}

/// Last successfully synced catalog.
#[derive(Debug)]
pub struct CatalogKey;

impl MetadataKey for CatalogKey {
    const NAME: &'static str = "asset_list";
    type Value = Catalog;
}

/// Epoch milliseconds of the last successful sync, as a decimal string.
#[derive(Debug)]
pub struct SyncTimestampKey;

impl MetadataKey for SyncTimestampKey {
    const NAME: &'static str = "json_cache_timestamp";
    type Value = String;
}

/// Persisted cursor position; `-1` means not yet positioned.
#[derive(Debug)]
pub struct CursorKey;

impl MetadataKey for CursorKey {
    const NAME: &'static str = "current_image_index";
    type Value = i64;
}

/// How often a new tab advances the cursor.
#[derive(Debug)]
pub struct UpdateFrequencyKey;

impl MetadataKey for UpdateFrequencyKey {
    const NAME: &'static str = "update_frequency";
    type Value = UpdateFrequency;
}

/// Epoch milliseconds of the last new-tab rotation.
#[derive(Debug)]
pub struct LastRotationKey;

impl MetadataKey for LastRotationKey {
    const NAME: &'static str = "last_update_time";
    type Value = i64;
}

/// Typed access to the `metadata` partition.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    store: Arc<dyn PersistentStore>,
}

impl MetadataStore {
    /// Handle over the `metadata` partition of `store`.
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self { store }
    }

    /// Decoded value for `K`, `None` when absent. A value that no longer
    /// decodes is [`AssetError::Serialization`].
    pub async fn get<K: MetadataKey>(&self) -> Result<Option<K::Value>> {
        let Some(bytes) = self.store.read(Partition::Metadata, K::NAME).await?
        else {
            return Ok(None);
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|err| {
            AssetError::Serialization(format!(
                "metadata key {} does not match its schema: {err}",
                K::NAME
            ))
        })
    }

    /// Replace the value for `K`.
    pub async fn put<K: MetadataKey>(&self, value: &K::Value) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.store.write(Partition::Metadata, K::NAME, &bytes).await
    }

    /// Drop every metadata key.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear(Partition::Metadata).await
    }
}

/// Typed access to the `images` partition: image URL to data URI.
#[derive(Debug, Clone)]
pub struct ImageStore {
    store: Arc<dyn PersistentStore>,
}

impl ImageStore {
    /// Handle over the `images` partition of `store`.
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self { store }
    }

    /// Data URI cached for `url`.
    pub async fn get(&self, url: &str) -> Result<Option<String>> {
        let Some(bytes) = self.store.read(Partition::Images, url).await? else {
            return Ok(None);
        };

        String::from_utf8(bytes).map(Some).map_err(|err| {
            AssetError::Serialization(format!(
                "cached image for {url} is not a UTF-8 data URI: {err}"
            ))
        })
    }

    /// Cache `data_uri` for `url`.
    pub async fn put(&self, url: &str, data_uri: &str) -> Result<()> {
        self.store
            .write(Partition::Images, url, data_uri.as_bytes())
            .await
    }

    /// Drop every cached image.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear(Partition::Images).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MemoryStore;

    #[tokio::test]
    async fn typed_keys_round_trip() {
        let store: Arc<dyn PersistentStore> = Arc::new(MemoryStore::new());
        let meta = MetadataStore::new(store);

        assert_eq!(meta.get::<CursorKey>().await.unwrap(), None);
        meta.put::<CursorKey>(&7).await.unwrap();
        assert_eq!(meta.get::<CursorKey>().await.unwrap(), Some(7));

        meta.put::<UpdateFrequencyKey>(&UpdateFrequency::EveryHour)
            .await
            .unwrap();
        assert_eq!(
            meta.get::<UpdateFrequencyKey>().await.unwrap(),
            Some(UpdateFrequency::EveryHour)
        );
    }

    #[tokio::test]
    async fn schema_drift_is_reported() {
        let store = Arc::new(MemoryStore::new());
        store
            .write(Partition::Metadata, CatalogKey::NAME, br#"{"not":"a list"}"#)
            .await
            .unwrap();
        let meta = MetadataStore::new(store);

        let err = meta.get::<CatalogKey>().await.unwrap_err();
        assert!(matches!(err, AssetError::Serialization(_)));
    }

    #[tokio::test]
    async fn image_store_keeps_data_uris_by_url() {
        let store: Arc<dyn PersistentStore> = Arc::new(MemoryStore::new());
        let images = ImageStore::new(store);
        images
            .put("https://img/a", "data:image/png;base64,AA==")
            .await
            .unwrap();
        assert_eq!(
            images.get("https://img/a").await.unwrap().as_deref(),
            Some("data:image/png;base64,AA==")
        );
        images.clear().await.unwrap();
        assert_eq!(images.get("https://img/a").await.unwrap(), None);
    }
}
