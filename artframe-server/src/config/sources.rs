use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file.
///
/// Durations are kept as strings here and parsed with `humantime` by the
/// loader so errors can name the offending key.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub catalog: FileCatalogConfig,
    #[serde(default)]
    pub cache: FileCacheConfig,
    #[serde(default)]
    pub prefetch: FilePrefetchConfig,
    #[serde(default)]
    pub http: FileHttpConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCatalogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size_suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCacheConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_capacity: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FilePrefetchConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warm_up: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileHttpConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timeout: Option<String>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub cache_root: Option<PathBuf>,
    pub catalog_url: Option<String>,
    pub base_url: Option<String>,
    pub image_size_suffix: Option<String>,
    pub metadata_expiry: Option<String>,
    pub prefetch_window: Option<usize>,
    pub warm_up: Option<bool>,
    pub memory_cache_capacity: Option<usize>,
    pub request_timeout: Option<String>,
    pub http_timeout: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; `gather` uses the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name).filter(|value| !value.trim().is_empty())
        };

        Self {
            config_path: var("ARTFRAME_CONFIG").map(PathBuf::from),
            server_host: var("SERVER_HOST"),
            server_port: var("SERVER_PORT").and_then(|s| s.trim().parse().ok()),
            cache_root: var("CACHE_DIR").map(PathBuf::from),
            catalog_url: var("ARTFRAME_CATALOG_URL"),
            base_url: var("ARTFRAME_BASE_URL"),
            image_size_suffix: var("ARTFRAME_IMAGE_SIZE_SUFFIX"),
            metadata_expiry: var("ARTFRAME_METADATA_EXPIRY"),
            prefetch_window: var("ARTFRAME_PREFETCH_WINDOW")
                .and_then(|s| s.trim().parse().ok()),
            warm_up: var("ARTFRAME_WARM_UP").and_then(|raw| parse_bool(&raw)),
            memory_cache_capacity: var("ARTFRAME_MEMORY_CACHE_CAPACITY")
                .and_then(|s| s.trim().parse().ok()),
            request_timeout: var("ARTFRAME_REQUEST_TIMEOUT"),
            http_timeout: var("ARTFRAME_HTTP_TIMEOUT"),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
