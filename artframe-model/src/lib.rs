//! Core data model definitions shared across Artframe crates.
#![allow(missing_docs)]

pub mod asset;
pub mod error;
pub mod preferences;
pub mod rpc;

// Intentionally curated re-exports for downstream consumers.
pub use asset::{AssetData, AssetRecord, Catalog, compose_link};
pub use error::{ModelError, Result as ModelResult};
pub use preferences::{CacheKind, UpdateFrequency};
pub use rpc::{RpcRequest, RpcResponse};
