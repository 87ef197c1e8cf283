use std::{
    any::type_name_of_val,
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use base64::{Engine, engine::general_purpose::STANDARD};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::memory_cache::MemoryCache;
use crate::{
    error::{AssetError, Result},
    infra::{HttpFetcher, ImageStore},
};

type SharedLoad = Shared<BoxFuture<'static, Result<String>>>;

/// Resolves image URLs to data URIs through memory, then the persistent
/// image partition, then the network.
#[derive(Clone)]
pub struct ImageLoader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    memory: Arc<Mutex<MemoryCache>>,
    images: ImageStore,
    fetcher: Arc<dyn HttpFetcher>,
    in_flight: Mutex<HashMap<String, (u64, SharedLoad)>>,
    next_ticket: AtomicU64,
    sf_leaders: AtomicU64,
    sf_waiters: AtomicU64,
    network_fetches: AtomicU64,
}

impl fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("ImageLoader")
            .field("memory_entries", &inner.memory.lock().len())
            .field("fetcher", &type_name_of_val(inner.fetcher.as_ref()))
            .field("in_flight", &inner.in_flight.lock().len())
            .field("sf_leaders", &inner.sf_leaders.load(Ordering::Relaxed))
            .field("sf_waiters", &inner.sf_waiters.load(Ordering::Relaxed))
            .field(
                "network_fetches",
                &inner.network_fetches.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl ImageLoader {
    /// Loader sharing `memory` with whoever else positions that cache.
    pub fn new(
        memory: Arc<Mutex<MemoryCache>>,
        images: ImageStore,
        fetcher: Arc<dyn HttpFetcher>,
    ) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                memory,
                images,
                fetcher,
                in_flight: Mutex::new(HashMap::new()),
                next_ticket: AtomicU64::new(0),
                sf_leaders: AtomicU64::new(0),
                sf_waiters: AtomicU64::new(0),
                network_fetches: AtomicU64::new(0),
            }),
        }
    }

    /// Data URI for `url`.
    ///
    /// Concurrent calls for the same URL share one resolution. A failed
    /// resolution leaves both cache tiers untouched.
    pub async fn load(&self, url: &str) -> Result<String> {
        if let Some(hit) = self.inner.memory.lock().get(url) {
            debug!("image memory hit: {}", url);
            return Ok(hit);
        }

        let future = {
            let mut in_flight = self.inner.in_flight.lock();
            if let Some((_, existing)) = in_flight.get(url) {
                let waiters =
                    self.inner.sf_waiters.fetch_add(1, Ordering::Relaxed) + 1;
                debug!("image load join: url={}, waiters={}", url, waiters);
                existing.clone()
            } else {
                let ticket =
                    self.inner.next_ticket.fetch_add(1, Ordering::Relaxed);
                self.inner.sf_leaders.fetch_add(1, Ordering::Relaxed);
                let inner = Arc::clone(&self.inner);
                let owned = url.to_string();
                let future = async move {
                    let result = inner.resolve(&owned).await;
                    inner.complete(&owned, ticket);
                    result
                }
                .boxed()
                .shared();
                in_flight.insert(url.to_string(), (ticket, future.clone()));
                debug!("image load lead: url={}", url);
                future
            }
        };

        future.await
    }

    /// Whether `url` is resident in the memory tier.
    pub fn is_cached(&self, url: &str) -> bool {
        self.inner.memory.lock().contains(url)
    }

    /// Number of image bodies actually requested over the network.
    pub fn network_fetches(&self) -> u64 {
        self.inner.network_fetches.load(Ordering::Relaxed)
    }
}

impl LoaderInner {
    async fn resolve(&self, url: &str) -> Result<String> {
        match self.images.get(url).await {
            Ok(Some(data_uri)) => {
                debug!("image store hit: {}", url);
                self.memory.lock().put(url.to_string(), data_uri.clone());
                return Ok(data_uri);
            }
            Ok(None) => {}
            Err(AssetError::Serialization(msg)) => {
                warn!("discarding unreadable cached image: {}", msg);
            }
            Err(err) => return Err(err),
        }

        self.network_fetches.fetch_add(1, Ordering::Relaxed);
        let response = self
            .fetcher
            .get(url, "image/*")
            .await
            .map_err(|err| AssetError::image_fetch(url, err.to_string()))?;

        if !response.is_success() {
            return Err(AssetError::image_fetch(
                url,
                format!("HTTP {}", response.status),
            ));
        }
        if response.body.is_empty() {
            return Err(AssetError::image_fetch(url, "empty response body"));
        }

        let mime = detect_mime(response.content_type.as_deref(), &response.body)
            .ok_or_else(|| {
                AssetError::image_fetch(url, "response is not a recognizable image")
            })?;
        let data_uri = encode_data_uri(&mime, &response.body);

        self.images.put(url, &data_uri).await?;
        if let Some(evicted) =
            self.memory.lock().put(url.to_string(), data_uri.clone())
        {
            debug!("memory cache evicted {}", evicted);
        }

        debug!(
            "image fetched: url={}, mime={}, bytes={}",
            url,
            mime,
            response.body.len()
        );
        Ok(data_uri)
    }

    fn complete(&self, url: &str, ticket: u64) {
        let mut in_flight = self.in_flight.lock();
        if in_flight
            .get(url)
            .is_some_and(|(current, _)| *current == ticket)
        {
            in_flight.remove(url);
        }
    }
}

/// MIME type for an image body: the declared `Content-Type` when it names an
/// image, otherwise whatever the magic bytes say.
pub fn detect_mime(content_type: Option<&str>, body: &[u8]) -> Option<String> {
    let declared = content_type
        .and_then(|raw| raw.split(';').next())
        .map(|essence| essence.trim().to_ascii_lowercase())
        .filter(|essence| essence.starts_with("image/"));
    if declared.is_some() {
        return declared;
    }

    image::guess_format(body)
        .ok()
        .map(|format| format.to_mime_type().to_string())
}

/// `data:<mime>;base64,<body>`
pub fn encode_data_uri(mime: &str, body: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(body))
}
