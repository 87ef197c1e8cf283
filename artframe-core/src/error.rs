use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the asset pipeline.
///
/// Variants carry rendered messages rather than source errors so the value is
/// `Clone`: a coalesced fetch hands the same outcome to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The persistent store failed to open, read, write or clear.
    #[error("Store error: {0}")]
    Store(String),

    /// The catalog request failed or returned an unusable document.
    #[error("Failed to fetch catalog: {0}")]
    Fetch(String),

    /// One image could not be fetched.
    #[error("Failed to fetch image {url}: {message}")]
    ImageFetch {
        /// Fully suffixed image URL.
        url: String,
        /// Transport failure or HTTP status.
        message: String,
    },

    /// An index outside `0..len` (or any index against an empty catalog).
    #[error("Invalid index: {index} (catalog has {len} entries)")]
    InvalidIndex {
        /// Index as requested.
        index: i64,
        /// Catalog length at the time of the request.
        len: usize,
    },

    /// A persisted or fetched value did not match its schema.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A foreground operation exceeded the request timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Setup that should not fail did, such as building the HTTP client.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AssetError {
    pub(crate) fn image_fetch(
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ImageFetch {
            url: url.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for AssetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AssetError {
    fn from(err: std::io::Error) -> Self {
        Self::Store(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AssetError>;
