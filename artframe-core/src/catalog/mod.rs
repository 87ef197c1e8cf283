//! Remote catalog synchronization.

/// Expiry-gated catalog refresh with coalesced fetches.
pub mod sync;

pub use sync::{CatalogSync, SyncOutcome, is_stale};
