//! Durable, best-effort storage of the conversation snapshot.
//!
//! The store keeps one JSON document under one key and always rewrites it whole.
//! [`SnapshotStore::load`] and [`SnapshotStore::save`] never fail: storage is a cache
//! for restarts, the running session is the source of truth.

mod backend;
mod error;
mod schema;
mod store;

pub use backend::{FileStorage, MemoryStorage, StorageBackend, UnavailableStorage};
pub use error::SnapshotStoreError;
pub use schema::Snapshot;
pub use store::{SnapshotStore, STORAGE_KEY};
