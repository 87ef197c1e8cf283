//! Fakes for exercising the daemon router without a network.
#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::{Result, anyhow};
use artframe_core::{
    AssetConfig, AssetService, ManualClock,
    infra::{FetchedResponse, HttpFetcher, MemoryStore, TransportError},
};
use artframe_model::{AssetRecord, Catalog};
use artframe_server::{routes, state::AppState};
use async_trait::async_trait;
use axum_test::TestServer;
use parking_lot::Mutex;

pub const CATALOG_URL: &str = "https://catalog.test/assets.json";
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

/// Serves a fixed catalog and a PNG for every image URL in it.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: Mutex<HashMap<String, FetchedResponse>>,
}

impl StaticFetcher {
    pub fn with_catalog(n: usize) -> Self {
        let fetcher = Self::default();
        let catalog: Catalog = (0..n).map(record).collect::<Vec<_>>().into();
        let body = serde_json::to_vec(&catalog).unwrap_or_default();
        fetcher.respond(CATALOG_URL, "application/json", body);
        for i in 0..n {
            fetcher.respond(&image_url(i), "image/png", PNG.to_vec());
        }
        fetcher
    }

    fn respond(&self, url: &str, content_type: &str, body: Vec<u8>) {
        self.responses.lock().insert(
            url.to_string(),
            FetchedResponse {
                status: 200,
                content_type: Some(content_type.to_string()),
                body,
            },
        );
    }
}

#[async_trait]
impl HttpFetcher for StaticFetcher {
    async fn get(
        &self,
        url: &str,
        _accept: &str,
    ) -> Result<FetchedResponse, TransportError> {
        Ok(self.responses.lock().get(url).cloned().unwrap_or(
            FetchedResponse {
                status: 404,
                content_type: None,
                body: Vec::new(),
            },
        ))
    }
}

pub fn record(i: usize) -> AssetRecord {
    AssetRecord {
        artist_link: String::new(),
        attribution: format!("Museum {i}"),
        attribution_link: String::new(),
        creator: format!("Artist {i}"),
        image: format!("https://img.test/art-{i}"),
        link: format!("asset/work-{i}"),
        source: "ci".to_string(),
        title: format!("Work {i}"),
        width: None,
        height: None,
    }
}

pub fn image_url(i: usize) -> String {
    format!("https://img.test/art-{i}=s1920")
}

pub fn asset_config() -> AssetConfig {
    AssetConfig {
        catalog_url: CATALOG_URL.to_string(),
        base_url: "https://arts.test/".to_string(),
        image_size_suffix: "=s1920".to_string(),
        metadata_expiry: Duration::from_secs(24 * 60 * 60),
        prefetch_window: 0,
        memory_cache_capacity: 4,
        request_timeout: Duration::from_secs(5),
        http_timeout: Duration::from_secs(5),
    }
}

/// Router over an in-memory service with a catalog of `n` entries.
pub fn test_server(n: usize) -> Result<TestServer> {
    let service = AssetService::new(
        asset_config(),
        Arc::new(MemoryStore::new()),
        Arc::new(StaticFetcher::with_catalog(n)),
        Arc::new(ManualClock::new(1_704_067_200_000)),
    );
    TestServer::new(routes::create_app(AppState::new(service)))
        .map_err(|err| anyhow!(err.to_string()))
}
