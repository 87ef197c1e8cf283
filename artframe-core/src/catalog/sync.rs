use std::{
    any::type_name_of_val,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use artframe_model::Catalog;
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    clock::{Clock, duration_ms},
    error::{AssetError, Result},
    infra::{CatalogKey, HttpFetcher, MetadataStore, SyncTimestampKey},
};

/// What a completed [`CatalogSync::sync`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The cached catalog was within its expiry window; nothing fetched.
    Fresh {
        /// Length of the cached catalog.
        entries: usize,
    },
    /// A new catalog document was fetched and stored.
    Refreshed {
        /// Length of the fetched catalog.
        entries: usize,
    },
}

impl SyncOutcome {
    /// Catalog length after the sync, whichever way it went.
    pub fn entries(self) -> usize {
        match self {
            SyncOutcome::Fresh { entries }
            | SyncOutcome::Refreshed { entries } => entries,
        }
    }
}

type SharedSync = Shared<BoxFuture<'static, Result<SyncOutcome>>>;

struct InFlight {
    generation: u64,
    future: SharedSync,
}

/// Decoded copy of the last catalog this process synced or found fresh in
/// the store. Replaced as a whole, so `Arc` identity changes exactly when the
/// catalog does.
struct Snapshot {
    synced_at: i64,
    catalog: Arc<Catalog>,
}

/// Keeps the persisted catalog fresh, collapsing concurrent callers onto a
/// single in-flight fetch.
#[derive(Clone)]
pub struct CatalogSync {
    inner: Arc<SyncInner>,
}

struct SyncInner {
    metadata: MetadataStore,
    fetcher: Arc<dyn HttpFetcher>,
    clock: Arc<dyn Clock>,
    catalog_url: String,
    expiry: Duration,
    in_flight: Mutex<Option<InFlight>>,
    generation: AtomicU64,
    snapshot: Mutex<Option<Snapshot>>,
    // Diagnostics: how many callers led vs. joined a sync, and real fetches
    sf_leaders: AtomicU64,
    sf_waiters: AtomicU64,
    network_fetches: AtomicU64,
}

impl fmt::Debug for CatalogSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("CatalogSync")
            .field("catalog_url", &inner.catalog_url)
            .field("expiry", &inner.expiry)
            .field("fetcher", &type_name_of_val(inner.fetcher.as_ref()))
            .field("in_flight", &inner.in_flight.lock().is_some())
            .field(
                "snapshot_entries",
                &inner.snapshot.lock().as_ref().map(|s| s.catalog.len()),
            )
            .field("sf_leaders", &inner.sf_leaders.load(Ordering::Relaxed))
            .field("sf_waiters", &inner.sf_waiters.load(Ordering::Relaxed))
            .field(
                "network_fetches",
                &inner.network_fetches.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl CatalogSync {
    /// Sync against `catalog_url`, treating a stored catalog older than
    /// `expiry` as stale.
    pub fn new(
        metadata: MetadataStore,
        fetcher: Arc<dyn HttpFetcher>,
        clock: Arc<dyn Clock>,
        catalog_url: impl Into<String>,
        expiry: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SyncInner {
                metadata,
                fetcher,
                clock,
                catalog_url: catalog_url.into(),
                expiry,
                in_flight: Mutex::new(None),
                generation: AtomicU64::new(0),
                snapshot: Mutex::new(None),
                sf_leaders: AtomicU64::new(0),
                sf_waiters: AtomicU64::new(0),
                network_fetches: AtomicU64::new(0),
            }),
        }
    }

    /// Bring the persisted catalog up to date.
    ///
    /// Callers arriving while a sync is running await that same sync and see
    /// its result, success or failure. On failure the previously stored
    /// catalog is left untouched.
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let future = {
            let mut slot = self.inner.in_flight.lock();
            match slot.as_ref() {
                Some(existing) => {
                    let waiters =
                        self.inner.sf_waiters.fetch_add(1, Ordering::Relaxed)
                            + 1;
                    debug!(
                        "catalog sync join: generation={}, waiters={}",
                        existing.generation, waiters
                    );
                    existing.future.clone()
                }
                None => {
                    let generation =
                        self.inner.generation.fetch_add(1, Ordering::Relaxed)
                            + 1;
                    self.inner.sf_leaders.fetch_add(1, Ordering::Relaxed);
                    let inner = Arc::clone(&self.inner);
                    let future = async move {
                        let result = inner.run().await;
                        inner.complete(generation);
                        result
                    }
                    .boxed()
                    .shared();
                    *slot = Some(InFlight {
                        generation,
                        future: future.clone(),
                    });
                    debug!("catalog sync lead: generation={}", generation);
                    future
                }
            }
        };

        future.await
    }

    /// The current catalog, syncing first when needed.
    ///
    /// A failed sync is tolerated when an older catalog is still cached; the
    /// failure is logged and the cached copy served. While nothing changes the
    /// same `Arc` is handed out, so callers can detect a new catalog with
    /// [`Arc::ptr_eq`].
    pub async fn catalog(&self) -> Result<Arc<Catalog>> {
        let synced = self.sync().await;

        let cached = match self.inner.current() {
            Some(catalog) => Some(catalog),
            None => self
                .inner
                .metadata
                .get::<CatalogKey>()
                .await
                .or_else(tolerate_schema_drift)?
                .map(Arc::new),
        };
        match (cached, synced) {
            (Some(catalog), Ok(_)) if !catalog.is_empty() => Ok(catalog),
            (Some(catalog), Err(err)) if !catalog.is_empty() => {
                warn!(
                    "catalog sync failed, serving cached catalog ({} entries): {}",
                    catalog.len(),
                    err
                );
                Ok(catalog)
            }
            (_, Err(err)) => Err(err),
            (_, Ok(_)) => Err(AssetError::Fetch(
                "no catalog available after sync".to_string(),
            )),
        }
    }

    /// Drop the decoded copy so the next call reads the store again. Needed
    /// after the metadata partition is cleared.
    pub fn forget(&self) {
        *self.inner.snapshot.lock() = None;
    }

    /// Number of catalog documents actually requested over the network.
    pub fn network_fetches(&self) -> u64 {
        self.inner.network_fetches.load(Ordering::Relaxed)
    }
}

impl SyncInner {
    async fn run(&self) -> Result<SyncOutcome> {
        let now_ms = self.clock.now_ms();
        let remembered = self
            .snapshot
            .lock()
            .as_ref()
            .map(|snap| (snap.synced_at, snap.catalog.len()));
        if let Some((synced_at, entries)) = remembered
            && !expired(synced_at, now_ms, self.expiry)
        {
            debug!("catalog fresh in memory: entries={}", entries);
            return Ok(SyncOutcome::Fresh { entries });
        }

        let timestamp = self
            .metadata
            .get::<SyncTimestampKey>()
            .await
            .or_else(tolerate_schema_drift)?;
        let cached = self
            .metadata
            .get::<CatalogKey>()
            .await
            .or_else(tolerate_schema_drift)?;

        if !is_stale(timestamp.as_deref(), cached.as_ref(), now_ms, self.expiry)
            && let (Some(synced_at), Some(catalog)) = (
                timestamp.as_deref().and_then(parse_timestamp),
                cached,
            )
        {
            let entries = catalog.len();
            self.remember(synced_at, catalog);
            debug!("catalog fresh in store: entries={}", entries);
            return Ok(SyncOutcome::Fresh { entries });
        }

        info!("catalog stale, fetching {}", self.catalog_url);
        self.network_fetches.fetch_add(1, Ordering::Relaxed);

        let response = self
            .fetcher
            .get(&self.catalog_url, "application/json")
            .await
            .map_err(|err| {
                AssetError::Fetch(format!("{}: {err}", self.catalog_url))
            })?;

        if !response.is_success() {
            return Err(AssetError::Fetch(format!(
                "{} returned HTTP {}",
                self.catalog_url, response.status
            )));
        }

        let catalog: Catalog =
            serde_json::from_slice(&response.body).map_err(|err| {
                AssetError::Fetch(format!(
                    "catalog document is not a valid asset list: {err}"
                ))
            })?;
        if catalog.is_empty() {
            return Err(AssetError::Fetch(
                "catalog document contains no assets".to_string(),
            ));
        }

        let entries = catalog.len();
        let synced_at = self.clock.now_ms();
        self.metadata.put::<CatalogKey>(&catalog).await?;
        self.metadata
            .put::<SyncTimestampKey>(&synced_at.to_string())
            .await?;
        self.remember(synced_at, catalog);

        info!("catalog refreshed: entries={}", entries);
        Ok(SyncOutcome::Refreshed { entries })
    }

    fn current(&self) -> Option<Arc<Catalog>> {
        self.snapshot
            .lock()
            .as_ref()
            .map(|snap| Arc::clone(&snap.catalog))
    }

    fn remember(&self, synced_at: i64, catalog: Catalog) {
        *self.snapshot.lock() = Some(Snapshot {
            synced_at,
            catalog: Arc::new(catalog),
        });
    }

    fn complete(&self, generation: u64) {
        let mut slot = self.in_flight.lock();
        if slot
            .as_ref()
            .is_some_and(|current| current.generation == generation)
        {
            *slot = None;
            debug!("catalog sync complete: generation={}", generation);
        }
    }
}

/// A value that no longer decodes is treated as missing so the next fetch
/// replaces it.
fn tolerate_schema_drift<T>(err: AssetError) -> Result<Option<T>> {
    match err {
        AssetError::Serialization(msg) => {
            warn!("ignoring undecodable cached metadata: {}", msg);
            Ok(None)
        }
        other => Err(other),
    }
}

/// Staleness policy for the cached catalog.
pub fn is_stale(
    timestamp: Option<&str>,
    catalog: Option<&Catalog>,
    now_ms: i64,
    expiry: Duration,
) -> bool {
    let Some(synced_at) = timestamp.and_then(parse_timestamp) else {
        return true;
    };

    if catalog.is_none_or(Catalog::is_empty) {
        return true;
    }

    expired(synced_at, now_ms, expiry)
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

fn expired(synced_at: i64, now_ms: i64, expiry: Duration) -> bool {
    now_ms.saturating_sub(synced_at) > duration_ms(expiry)
}
