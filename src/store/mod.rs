//! # Resource Store
//!
//! Narrow read/write interface to the cluster used by the reconciler and the
//! config resynchronizer.
//!
//! - `api.rs` - `KubeStore`, backed by a `kube::Api`
//! - `memory.rs` - `MemoryStore`, an in-process store with the same
//!   optimistic-concurrency and status-subresource semantics, used by tests

mod api;
mod memory;

pub use api::KubeStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },
    /// The object changed since it was read (stale `resourceVersion`)
    #[error("{kind} '{name}' was modified concurrently")]
    VersionConflict { kind: String, name: String },
    #[error("object has no name")]
    MissingName,
    #[error("failed to encode object: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Kubernetes API error: {0}")]
    Api(#[source] kube::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Get/replace access to one kind of namespaced object
#[async_trait]
pub trait ResourceStore<K>: Send + Sync
where
    K: Send + Sync + 'static,
{
    /// Fetch an object by name
    async fn get(&self, name: &str) -> Result<K, StoreError>;

    /// Replace the `status` of an object through the status subresource.
    /// Changes outside `status` are not persisted. The write is checked
    /// against the object's `resourceVersion` and fails with
    /// `VersionConflict` if it is stale.
    async fn replace_status(&self, obj: &K) -> Result<K, StoreError>;
}
