//! In-memory object store with versioned writes.

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::agent::{
    domain::ObjectKey,
    ports::{ObjectEntry, ObjectStore, ObjectStoreResult, PutObject, StorageError},
};

/// First version suffix used when a key is already taken.
pub(crate) const FIRST_VERSION: u32 = 2;

/// Thread-safe in-memory object store.
#[derive(Clone)]
pub struct InMemoryObjectStore {
    state: Arc<RwLock<BTreeMap<ObjectKey, StoredObject>>>,
    available: Arc<AtomicBool>,
    read_delay_ms: Arc<AtomicU64>,
    clock: Arc<dyn Clock + Send + Sync>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    entry: ObjectEntry,
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("available", &self.available.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl InMemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store stamping writes with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            state: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
            read_delay_ms: Arc::new(AtomicU64::new(0)),
            clock,
        }
    }

    /// Makes every operation fail with [`StorageError::Unavailable`] until
    /// re-enabled.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Delays every `get` and `head` by `delay`; writes are unaffected.
    pub fn set_read_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.read_delay_ms.store(millis, Ordering::SeqCst);
    }

    async fn delay_read(&self) {
        let millis = self.read_delay_ms.load(Ordering::SeqCst);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    fn ensure_available(&self) -> ObjectStoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable(
                "in-memory store disabled".to_owned(),
            ))
        }
    }
}

fn lock_error(err: impl std::fmt::Display) -> StorageError {
    StorageError::persistence(std::io::Error::other(err.to_string()))
}

/// Returns `requested`, or its first free versioned variant.
pub(crate) fn free_key(requested: &ObjectKey, taken: impl Fn(&ObjectKey) -> bool) -> ObjectKey {
    if !taken(requested) {
        return requested.clone();
    }
    let mut version = FIRST_VERSION;
    loop {
        let candidate = requested.versioned(version);
        if !taken(&candidate) {
            return candidate;
        }
        version = version.saturating_add(1);
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, object: PutObject) -> ObjectStoreResult<ObjectKey> {
        self.ensure_available()?;
        let mut state = self.state.write().map_err(lock_error)?;
        let key = free_key(&object.key, |candidate| state.contains_key(candidate));
        let entry = ObjectEntry {
            key: key.clone(),
            size: u64::try_from(object.bytes.len()).unwrap_or(u64::MAX),
            content_type: object.content_type,
            tags: object.tags,
            metadata: object.metadata,
            stored_at: self.clock.utc(),
        };
        state.insert(
            key.clone(),
            StoredObject {
                bytes: object.bytes,
                entry,
            },
        );
        Ok(key)
    }

    async fn get(&self, key: &ObjectKey) -> ObjectStoreResult<Vec<u8>> {
        self.delay_read().await;
        self.ensure_available()?;
        let state = self.state.read().map_err(lock_error)?;
        state
            .get(key)
            .map(|stored| stored.bytes.clone())
            .ok_or_else(|| StorageError::NotFound(key.clone()))
    }

    async fn head(&self, key: &ObjectKey) -> ObjectStoreResult<Option<ObjectEntry>> {
        self.delay_read().await;
        self.ensure_available()?;
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(key).map(|stored| stored.entry.clone()))
    }

    async fn list(&self, prefix: &str) -> ObjectStoreResult<Vec<ObjectEntry>> {
        self.ensure_available()?;
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .values()
            .filter(|stored| stored.entry.key.has_prefix(prefix))
            .map(|stored| stored.entry.clone())
            .collect())
    }
}
