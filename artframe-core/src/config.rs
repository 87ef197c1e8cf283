use std::time::Duration;

/// Catalog document published for the new-tab extension.
pub const DEFAULT_CATALOG_URL: &str =
    "https://www.gstatic.com/culturalinstitute/tabext/imax_2_2.json";
/// Prefix for relative links in catalog records.
pub const DEFAULT_BASE_URL: &str = "https://artsandculture.google.com/";
/// Rendition requested for every image (1920px, webp when available).
pub const DEFAULT_IMAGE_SIZE_SUFFIX: &str = "=s1920-rw";
/// Catalog age after which a sync re-fetches (24 hours).
pub const DEFAULT_METADATA_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);
/// Entries warmed after the cursor.
pub const DEFAULT_PREFETCH_WINDOW: usize = 5;
/// Decoded images kept in memory.
pub const DEFAULT_MEMORY_CACHE_CAPACITY: usize = 10;
/// Bound on one foreground operation.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Bound on one HTTP request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Tunables for the asset pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    /// Remote catalog document (JSON array of records).
    pub catalog_url: String,
    /// Base URL relative record links are resolved against.
    pub base_url: String,
    /// Appended to each record's `image` to form the fetched URL.
    pub image_size_suffix: String,
    /// Age after which the cached catalog is re-fetched.
    pub metadata_expiry: Duration,
    /// Number of entries warmed ahead of the cursor.
    pub prefetch_window: usize,
    /// Maximum number of decoded images held in memory.
    pub memory_cache_capacity: usize,
    /// Upper bound for one foreground (UI-triggered) operation.
    pub request_timeout: Duration,
    /// Per-request timeout for the HTTP client.
    pub http_timeout: Duration,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            image_size_suffix: DEFAULT_IMAGE_SIZE_SUFFIX.to_string(),
            metadata_expiry: DEFAULT_METADATA_EXPIRY,
            prefetch_window: DEFAULT_PREFETCH_WINDOW,
            memory_cache_capacity: DEFAULT_MEMORY_CACHE_CAPACITY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}
