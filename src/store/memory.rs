//! In-memory store.

use super::{ResourceStore, StoreError};
use async_trait::async_trait;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-process `ResourceStore` keyed by object name
///
/// Mirrors the API server's optimistic concurrency: every stored object gets a
/// numeric `resourceVersion`, and `replace_status` fails with `VersionConflict`
/// when the incoming object carries a different one. Like a write to the
/// status subresource, only the incoming `status` is kept; every other field
/// stays as stored. Reads and writes are counted so callers can assert how
/// much traffic an operation generated.
#[derive(Debug)]
pub struct MemoryStore<K> {
    objects: Mutex<HashMap<String, K>>,
    kind: String,
    gets: AtomicUsize,
    replaces: AtomicUsize,
    conflict_next_replace: AtomicBool,
}

impl<K> MemoryStore<K>
where
    K: Resource<DynamicType = ()> + Clone,
{
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            kind: K::kind(&()).into_owned(),
            gets: AtomicUsize::new(0),
            replaces: AtomicUsize::new(0),
            conflict_next_replace: AtomicBool::new(false),
        }
    }

    /// Insert or overwrite an object, bypassing version checks.
    /// Objects without a `resourceVersion` get version `1`.
    pub fn insert(&self, mut obj: K) {
        let Some(name) = obj.meta().name.clone() else {
            return;
        };
        let meta = obj.meta_mut();
        if meta.resource_version.is_none() {
            meta.resource_version = Some("1".to_string());
        }
        self.lock().insert(name, obj);
    }

    /// Current copy of an object, without counting a read
    pub fn peek(&self, name: &str) -> Option<K> {
        self.lock().get(name).cloned()
    }

    /// Number of `get` calls served
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `replace_status` calls attempted
    pub fn replace_count(&self) -> usize {
        self.replaces.load(Ordering::SeqCst)
    }

    /// Make the next `replace_status` fail as if another writer got there first
    pub fn conflict_next_replace(&self) {
        self.conflict_next_replace.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, K>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<K> Default for MemoryStore<K>
where
    K: Resource<DynamicType = ()> + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K> ResourceStore<K> for MemoryStore<K>
where
    K: Resource<DynamicType = ()> + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, name: &str) -> Result<K, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: self.kind.clone(),
                name: name.to_string(),
            })
    }

    async fn replace_status(&self, obj: &K) -> Result<K, StoreError> {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        let name = obj.meta().name.clone().ok_or(StoreError::MissingName)?;
        let conflict = || StoreError::VersionConflict {
            kind: self.kind.clone(),
            name: name.clone(),
        };

        if self.conflict_next_replace.swap(false, Ordering::SeqCst) {
            return Err(conflict());
        }

        let mut objects = self.lock();
        let Some(current) = objects.get(&name) else {
            return Err(StoreError::NotFound {
                kind: self.kind.clone(),
                name: name.clone(),
            });
        };
        if current.meta().resource_version != obj.meta().resource_version {
            return Err(conflict());
        }

        let next_version = current
            .meta()
            .resource_version
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        let mut stored = with_status_of(current, obj).map_err(StoreError::Encode)?;
        stored.meta_mut().resource_version = Some(next_version.to_string());
        objects.insert(name, stored.clone());
        Ok(stored)
    }
}

/// `current` with its `status` replaced by the one in `incoming`
fn with_status_of<K>(current: &K, incoming: &K) -> Result<K, serde_json::Error>
where
    K: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(current)?;
    let status = match serde_json::to_value(incoming)? {
        Value::Object(mut fields) => fields.remove("status"),
        _ => None,
    };
    if let Value::Object(fields) = &mut merged {
        match status {
            Some(status) => fields.insert("status".to_string(), status),
            None => fields.remove("status"),
        };
    }
    serde_json::from_value(merged)
}
