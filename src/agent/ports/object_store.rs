//! Artifact object store port.

use crate::agent::domain::ObjectKey;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for object store operations.
pub type ObjectStoreResult<T> = Result<T, StorageError>;

/// Object write request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    /// Requested key; the store may pick a versioned variant.
    pub key: ObjectKey,
    /// Object bytes.
    pub bytes: Vec<u8>,
    /// MIME content type.
    pub content_type: String,
    /// Searchable tags.
    pub tags: BTreeMap<String, String>,
    /// Free-form metadata.
    pub metadata: BTreeMap<String, String>,
}

impl PutObject {
    /// Creates a write request with no tags or metadata.
    #[must_use]
    pub fn new(key: ObjectKey, bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            key,
            bytes,
            content_type: content_type.into(),
            tags: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }
}

/// Listing entry for a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Stored key.
    pub key: ObjectKey,
    /// Size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
    /// Searchable tags.
    pub tags: BTreeMap<String, String>,
    /// Free-form metadata.
    pub metadata: BTreeMap<String, String>,
    /// Time the object was written.
    pub stored_at: DateTime<Utc>,
}

/// System of record for artifact bytes.
///
/// Writes never overwrite: when the requested key is taken the store writes
/// to the next free `{stem}_v{n}.{ext}` key and returns it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores an object and returns the key actually written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when the store cannot be
    /// reached.
    async fn put(&self, object: PutObject) -> ObjectStoreResult<ObjectKey>;

    /// Reads the bytes stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when no object has that key.
    async fn get(&self, key: &ObjectKey) -> ObjectStoreResult<Vec<u8>>;

    /// Returns the entry for `key`, or `None` when absent.
    async fn head(&self, key: &ObjectKey) -> ObjectStoreResult<Option<ObjectEntry>>;

    /// Lists entries whose key starts with `prefix`, ordered by key.
    async fn list(&self, prefix: &str) -> ObjectStoreResult<Vec<ObjectEntry>>;
}

/// Errors returned by object store implementations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// No object has the requested key.
    #[error("object not found: {0}")]
    NotFound(ObjectKey),

    /// The key cannot be used with this store.
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    /// The store cannot be reached.
    #[error("object store unavailable: {0}")]
    Unavailable(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StorageError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns whether the failure lies with the store rather than the key,
    /// so a later attempt may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Persistence(_))
    }
}
