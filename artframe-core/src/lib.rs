//! # Artframe Core
//!
//! The asset pipeline behind the Artframe new-tab page: it turns a remote
//! JSON catalog of artworks plus per-image fetches into an offline-durable,
//! randomly addressable sequence of ready-to-display records.
//!
//! ## Overview
//!
//! - **Catalog sync**: [`catalog::CatalogSync`] refreshes the persisted
//!   catalog when it is older than the configured expiry, with concurrent
//!   callers sharing one fetch.
//! - **Two-tier image cache**: [`images::ImageLoader`] resolves image URLs to
//!   data URIs through a bounded [`images::MemoryCache`], then the
//!   persistent `images` partition, then the network.
//! - **Prefetching**: [`prefetch::Prefetcher`] warms the entries that follow
//!   the cursor without blocking the caller.
//! - **Cursor and rotation**: [`cursor::Cursor`] keeps a persisted position
//!   with wraparound; [`rotation::RotationPolicy`] decides when a new tab
//!   advances it.
//! - **Service and dispatch**: [`service::AssetService`] composes all of the
//!   above; [`rpc::dispatch`] answers JSON messages with it.
//!
//! ## Storage
//!
//! Durable state goes through the [`infra::PersistentStore`] port. The
//! production adapter keeps images in `cacache` and each metadata key in its
//! own atomically replaced file; tests use [`infra::MemoryStore`].
//!
//! ## Example
//!
//! The synchronous building blocks on their own:
//!
//! ```
//! use artframe_core::{
//!     images::MemoryCache, prefetch::window_indices, rotation::rotation_due,
//! };
//! use artframe_model::UpdateFrequency;
//!
//! // The memory tier keeps what is near the viewer, not what is recent.
//! let mut memory = MemoryCache::new(2);
//! memory.index_catalog((0..10).map(|i| format!("https://img/{i}")));
//! memory.focus(0);
//! memory.put("https://img/0".into(), "data:a".into());
//! memory.put("https://img/1".into(), "data:b".into());
//! let evicted = memory.put("https://img/5".into(), "data:c".into());
//! assert_eq!(evicted.as_deref(), Some("https://img/5"));
//! assert!(memory.contains("https://img/0"));
//!
//! // Prefetch looks ahead of the cursor and wraps.
//! assert_eq!(window_indices(8, 3, 10), vec![9, 0, 1]);
//!
//! // An hourly rotation waits for the full hour.
//! let hour_ms = 60 * 60 * 1000;
//! assert!(!rotation_due(UpdateFrequency::EveryHour, Some(0), hour_ms - 1));
//! assert!(rotation_due(UpdateFrequency::EveryHour, Some(0), hour_ms));
//! ```

pub mod catalog;
/// Time source used for expiry and rotation decisions
pub mod clock;
/// Pipeline tunables and their defaults
pub mod config;
/// The persisted position in the catalog
pub mod cursor;
/// Error types and the crate-wide result alias
pub mod error;
pub mod images;
pub mod infra;
/// Background warming of the entries after the cursor
pub mod prefetch;
/// Update-frequency policy for new-tab rotation
pub mod rotation;
pub mod rpc;
pub mod service;

pub use catalog::{CatalogSync, SyncOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AssetConfig;
pub use error::{AssetError, Result};
pub use prefetch::{PrefetchOutcome, PrefetchReport};
pub use service::AssetService;
