//! The asset service: one value wiring the catalog synchronizer, both cache
//! tiers, the prefetcher, the cursor and the rotation policy together.
//!
//! Foreground operations (everything the new-tab page waits on) run under
//! [`AssetConfig::request_timeout`]. Look-ahead work is never awaited by
//! them.

use std::{future::Future, path::PathBuf, sync::Arc};

use artframe_model::{AssetData, CacheKind, Catalog, UpdateFrequency};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    catalog::{CatalogSync, SyncOutcome},
    clock::{Clock, SystemClock},
    config::AssetConfig,
    cursor::Cursor,
    error::{AssetError, Result},
    images::{ImageLoader, MemoryCache},
    infra::{
        DiskStore, HttpFetcher, ImageStore, MetadataStore, PersistentStore,
        ReqwestFetcher, StoreRoot,
    },
    prefetch::{PrefetchOutcome, Prefetcher},
    rotation::RotationPolicy,
};

/// Shared handle to the whole pipeline. Clones are cheap and see the same
/// caches.
#[derive(Debug, Clone)]
pub struct AssetService {
    inner: Arc<ServiceInner>,
}

#[derive(Debug)]
struct ServiceInner {
    config: AssetConfig,
    metadata: MetadataStore,
    images: ImageStore,
    memory: Arc<Mutex<MemoryCache>>,
    /// Catalog whose URL positions the memory tier currently holds.
    indexed: Mutex<Option<Arc<Catalog>>>,
    catalog: CatalogSync,
    loader: ImageLoader,
    prefetcher: Prefetcher,
    cursor: Cursor,
    rotation: RotationPolicy,
}

impl AssetService {
    /// Wire every component over the given ports.
    pub fn new(
        config: AssetConfig,
        store: Arc<dyn PersistentStore>,
        fetcher: Arc<dyn HttpFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let metadata = MetadataStore::new(Arc::clone(&store));
        let images = ImageStore::new(store);
        let memory =
            Arc::new(Mutex::new(MemoryCache::new(config.memory_cache_capacity)));

        let catalog = CatalogSync::new(
            metadata.clone(),
            Arc::clone(&fetcher),
            Arc::clone(&clock),
            config.catalog_url.clone(),
            config.metadata_expiry,
        );
        let loader =
            ImageLoader::new(Arc::clone(&memory), images.clone(), fetcher);
        let prefetcher = Prefetcher::new(
            catalog.clone(),
            loader.clone(),
            config.image_size_suffix.as_str(),
            config.prefetch_window,
        );
        let cursor = Cursor::new(metadata.clone(), prefetcher.clone());
        let rotation = RotationPolicy::new(metadata.clone(), clock);

        Self {
            inner: Arc::new(ServiceInner {
                config,
                metadata,
                images,
                memory,
                indexed: Mutex::new(None),
                catalog,
                loader,
                prefetcher,
                cursor,
                rotation,
            }),
        }
    }

    /// Service over a [`DiskStore`] at `cache_root`, the network and the
    /// system clock.
    pub fn open(config: AssetConfig, cache_root: PathBuf) -> Result<Self> {
        let store = Arc::new(DiskStore::new(StoreRoot::new(cache_root)));
        let fetcher = Arc::new(ReqwestFetcher::new(config.http_timeout)?);
        Ok(Self::new(config, store, fetcher, Arc::new(SystemClock)))
    }

    /// Configuration the service was built with.
    pub fn config(&self) -> &AssetConfig {
        &self.inner.config
    }

    /// The catalog synchronizer.
    pub fn catalog_sync(&self) -> &CatalogSync {
        &self.inner.catalog
    }

    /// The two-tier image loader.
    pub fn loader(&self) -> &ImageLoader {
        &self.inner.loader
    }

    /// The look-ahead prefetcher.
    pub fn prefetcher(&self) -> &Prefetcher {
        &self.inner.prefetcher
    }

    /// Record for catalog position `index`, with its image.
    pub async fn image_at(&self, index: i64) -> Result<AssetData> {
        self.bounded("image_at", async {
            let catalog = self.catalog().await?;
            let index = usize::try_from(index)
                .ok()
                .filter(|i| *i < catalog.len())
                .ok_or(AssetError::InvalidIndex {
                    index,
                    len: catalog.len(),
                })?;
            self.assemble(&catalog, index).await
        })
        .await
    }

    /// Record at the cursor. An unset cursor shows entry 0 without moving.
    pub async fn current_image(&self) -> Result<AssetData> {
        self.bounded("current_image", async {
            let catalog = self.catalog().await?;
            let index = self
                .inner
                .cursor
                .current(catalog.len())
                .await?
                .ok_or(AssetError::InvalidIndex { index: 0, len: 0 })?;
            self.assemble(&catalog, index).await
        })
        .await
    }

    /// Advance the cursor (wrapping) and return the record there.
    pub async fn next_image(&self) -> Result<AssetData> {
        self.bounded("next_image", self.step_forward()).await
    }

    /// Step the cursor back (wrapping) and return the record there.
    pub async fn previous_image(&self) -> Result<AssetData> {
        self.bounded("previous_image", async {
            let catalog = self.catalog().await?;
            let index = self.inner.cursor.retreat(catalog.len()).await?;
            self.assemble(&catalog, index).await
        })
        .await
    }

    /// Data URI for an arbitrary image URL, through both cache tiers.
    pub async fn image_data_url(&self, url: &str) -> Result<String> {
        self.bounded("image_data_url", self.inner.loader.load(url))
            .await
    }

    /// Cursor position; `None` when no catalog is available.
    pub async fn current_index(&self) -> Result<Option<usize>> {
        self.bounded("current_index", async {
            let catalog = match self.catalog().await {
                Ok(catalog) => catalog,
                Err(err) => {
                    warn!("no catalog for current index: {}", err);
                    return Ok(None);
                }
            };
            self.inner.cursor.current(catalog.len()).await
        })
        .await
    }

    /// Move the cursor to `index`, which must be within the catalog.
    pub async fn set_current_index(&self, index: i64) -> Result<usize> {
        self.bounded("set_current_index", async {
            let catalog = self.catalog().await?;
            self.inner.cursor.set_to(index, catalog.len()).await
        })
        .await
    }

    /// What a newly opened tab shows: the next artwork when a rotation is
    /// due under the configured frequency, the current one otherwise.
    pub async fn new_tab_image(&self) -> Result<AssetData> {
        self.bounded("new_tab_image", async {
            if self.inner.rotation.is_due().await? {
                let data = self.step_forward().await?;
                self.inner.rotation.record_rotation().await?;
                Ok(data)
            } else {
                let catalog = self.catalog().await?;
                let index = self
                    .inner
                    .cursor
                    .current(catalog.len())
                    .await?
                    .ok_or(AssetError::InvalidIndex { index: 0, len: 0 })?;
                self.assemble(&catalog, index).await
            }
        })
        .await
    }

    /// Stored rotation frequency.
    pub async fn update_frequency(&self) -> Result<UpdateFrequency> {
        self.bounded("update_frequency", self.inner.rotation.frequency())
            .await
    }

    /// Persist a new rotation frequency.
    pub async fn set_update_frequency(
        &self,
        frequency: UpdateFrequency,
    ) -> Result<()> {
        self.bounded(
            "set_update_frequency",
            self.inner.rotation.set_frequency(frequency),
        )
        .await
    }

    /// Drop persisted state. Clearing images also empties the memory tier.
    pub async fn clear_cache(&self, kind: CacheKind) -> Result<()> {
        self.bounded("clear_cache", async {
            if kind.includes_images() {
                self.inner.images.clear().await?;
                self.inner.memory.lock().clear();
            }
            if kind.includes_metadata() {
                self.inner.metadata.clear().await?;
                self.inner.catalog.forget();
            }
            info!("cache cleared: {}", kind);
            Ok(())
        })
        .await
    }

    /// Refresh the catalog if it has expired.
    pub async fn sync(&self) -> Result<SyncOutcome> {
        self.bounded("sync", self.inner.catalog.sync()).await
    }

    /// Load the current image and sweep the window after it. Failures are
    /// logged; this never errors.
    pub async fn warm_up(&self) -> PrefetchOutcome {
        let catalog = match self.catalog().await {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!("warm-up skipped, no catalog: {}", err);
                return PrefetchOutcome::NoCatalog;
            }
        };
        let from = match self.inner.cursor.current(catalog.len()).await {
            Ok(Some(index)) => index,
            Ok(None) => return PrefetchOutcome::NoCatalog,
            Err(err) => {
                warn!("warm-up could not read cursor, starting at 0: {}", err);
                0
            }
        };

        if let Err(err) = self.assemble(&catalog, from).await {
            warn!("warm-up failed to load current image {}: {}", from, err);
        }
        self.inner.prefetcher.prefetch(from).await
    }

    async fn step_forward(&self) -> Result<AssetData> {
        let catalog = self.catalog().await?;
        let index = self.inner.cursor.advance(catalog.len()).await?;
        self.assemble(&catalog, index).await
    }

    /// Current catalog. The memory tier's position index is rebuilt only
    /// when the catalog changed since the last call.
    async fn catalog(&self) -> Result<Arc<Catalog>> {
        let catalog = self.inner.catalog.catalog().await?;

        let mut indexed = self.inner.indexed.lock();
        if indexed
            .as_ref()
            .is_none_or(|previous| !Arc::ptr_eq(previous, &catalog))
        {
            let suffix = &self.inner.config.image_size_suffix;
            self.inner.memory.lock().index_catalog(
                catalog.iter().map(|record| record.image_url(suffix)),
            );
            *indexed = Some(Arc::clone(&catalog));
            debug!("memory tier re-indexed: entries={}", catalog.len());
        }
        drop(indexed);

        Ok(catalog)
    }

    async fn assemble(&self, catalog: &Catalog, index: usize) -> Result<AssetData> {
        let record = catalog.get(index).ok_or(AssetError::InvalidIndex {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            len: catalog.len(),
        })?;
        self.inner.memory.lock().focus(index);

        let url = record.image_url(&self.inner.config.image_size_suffix);
        let data_url = self.inner.loader.load(&url).await?;
        debug!("assembled asset {}: {}", index, record.title);

        Ok(AssetData {
            record: record.resolved(&self.inner.config.base_url),
            data_url,
        })
    }

    async fn bounded<T, F>(&self, operation: &'static str, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let limit = self.inner.config.request_timeout;
        match tokio::time::timeout(limit, work).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} timed out after {:?}", operation, limit);
                Err(AssetError::Timeout(limit))
            }
        }
    }
}
