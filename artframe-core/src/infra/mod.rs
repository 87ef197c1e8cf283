//! Storage and network adapters.
//!
//! The persistent tier is a `cacache` directory for images plus one small
//! file per metadata key, behind the [`PersistentStore`] port. The network is
//! reached through the [`HttpFetcher`] port. Both are injected so tests can
//! swap in in-memory fakes.

/// `cacache` images plus per-key metadata files.
pub mod disk_store;
/// HTTP fetch port and its `reqwest` adapter.
pub mod http;
/// In-memory store for tests.
pub mod memory_store;
pub mod schema;
/// The persistent store port.
pub mod store;

pub use disk_store::*;
pub use http::*;
pub use memory_store::*;
pub use schema::*;
pub use store::*;
