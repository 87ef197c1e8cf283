//! Shared fakes and fixtures for core integration tests.
#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc, time::Duration};

use artframe_core::{
    AssetConfig, AssetService, ManualClock,
    infra::{FetchedResponse, HttpFetcher, MemoryStore, TransportError},
};
use artframe_model::{AssetRecord, Catalog};
use async_trait::async_trait;
use parking_lot::Mutex;

pub const CATALOG_URL: &str = "https://catalog.test/tabext/assets.json";
pub const BASE_URL: &str = "https://arts.test/";
pub const SIZE_SUFFIX: &str = "=s1920-rw";
/// 2024-01-01T00:00:00Z
pub const EPOCH_MS: i64 = 1_704_067_200_000;
pub const HOUR: Duration = Duration::from_secs(60 * 60);

/// Smallest body `image::guess_format` recognizes as PNG.
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

#[derive(Debug, Clone)]
enum Route {
    Respond(FetchedResponse),
    Transport(String),
}

/// In-memory stand-in for the network. Unrouted URLs answer 404.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every response waits this long first, so concurrent callers overlap.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn route_catalog(&self, url: &str, catalog: &Catalog) {
        let body = serde_json::to_vec(catalog).unwrap_or_default();
        self.route(url, 200, Some("application/json"), body);
    }

    pub fn route_image(&self, url: &str) {
        self.route(url, 200, Some("image/png"), PNG.to_vec());
    }

    pub fn route_status(&self, url: &str, status: u16) {
        self.route(url, status, Some("text/html"), b"nope".to_vec());
    }

    pub fn route_transport_error(&self, url: &str, message: &str) {
        self.routes
            .lock()
            .insert(url.to_string(), Route::Transport(message.to_string()));
    }

    pub fn route(
        &self,
        url: &str,
        status: u16,
        content_type: Option<&str>,
        body: Vec<u8>,
    ) {
        self.routes.lock().insert(
            url.to_string(),
            Route::Respond(FetchedResponse {
                status,
                content_type: content_type.map(str::to_string),
                body,
            }),
        );
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|call| *call == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl HttpFetcher for FakeFetcher {
    async fn get(
        &self,
        url: &str,
        _accept: &str,
    ) -> Result<FetchedResponse, TransportError> {
        self.calls.lock().push(url.to_string());
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let route = self.routes.lock().get(url).cloned();
        match route {
            Some(Route::Respond(response)) => Ok(response),
            Some(Route::Transport(message)) => Err(TransportError(message)),
            None => Ok(FetchedResponse {
                status: 404,
                content_type: None,
                body: Vec::new(),
            }),
        }
    }
}

pub fn record(i: usize) -> AssetRecord {
    AssetRecord {
        artist_link: format!("entity/artist-{i}"),
        attribution: format!("Museum {i}"),
        attribution_link: format!("partner/museum-{i}"),
        creator: format!("Artist {i}"),
        image: format!("https://img.test/art-{i}"),
        link: format!("asset/work-{i}"),
        source: "ci".to_string(),
        title: format!("Work {i}"),
        width: Some(1920),
        height: Some(1080),
    }
}

pub fn catalog(n: usize) -> Catalog {
    (0..n).map(record).collect::<Vec<_>>().into()
}

/// URL the pipeline fetches for entry `i` of [`catalog`].
pub fn image_url(i: usize) -> String {
    format!("https://img.test/art-{i}{SIZE_SUFFIX}")
}

pub fn test_config() -> AssetConfig {
    AssetConfig {
        catalog_url: CATALOG_URL.to_string(),
        base_url: BASE_URL.to_string(),
        image_size_suffix: SIZE_SUFFIX.to_string(),
        metadata_expiry: Duration::from_secs(24 * 60 * 60),
        prefetch_window: 5,
        memory_cache_capacity: 10,
        request_timeout: Duration::from_secs(5),
        http_timeout: Duration::from_secs(5),
    }
}

/// A service over in-memory fakes with a catalog of `n` entries, every image
/// routed.
pub struct Harness {
    pub service: AssetService,
    pub fetcher: Arc<FakeFetcher>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(n: usize) -> Self {
        Self::with_config(n, test_config())
    }

    pub fn with_config(n: usize, config: AssetConfig) -> Self {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.route_catalog(CATALOG_URL, &catalog(n));
        for i in 0..n {
            fetcher.route_image(&image_url(i));
        }
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(EPOCH_MS));
        let service = AssetService::new(
            config,
            store.clone(),
            fetcher.clone(),
            clock.clone(),
        );

        Self {
            service,
            fetcher,
            store,
            clock,
        }
    }

    /// Same fakes, fresh service (empty memory tier, nothing in flight).
    pub fn restart(&self, config: AssetConfig) -> AssetService {
        AssetService::new(
            config,
            self.store.clone(),
            self.fetcher.clone(),
            self.clock.clone(),
        )
    }
}

/// Wait for detached prefetch tasks spawned by cursor moves to settle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
