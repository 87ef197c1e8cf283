//! Image resolution: the bounded memory tier and the read-through loader.

/// Read-through resolution of image URLs to data URIs.
pub mod loader;
/// The bounded in-memory tier.
pub mod memory_cache;

pub use loader::{ImageLoader, detect_mime, encode_data_uri};
pub use memory_cache::MemoryCache;
