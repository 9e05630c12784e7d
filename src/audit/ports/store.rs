//! Append-only audit store port.

use crate::audit::domain::{AuditEntry, AuditQuery};
use crate::request::RequestId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for audit store operations.
pub type AuditStoreResult<T> = Result<T, AuditStoreError>;

/// Outcome of appending one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The entry was stored.
    Inserted,
    /// An entry with the same deduplication key already exists.
    Duplicate,
}

/// Append-only keyed log with secondary lookup by user, action, and time.
///
/// Implementations must tolerate concurrent appends without lost writes
/// and must never overwrite an existing entry.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Appends `entry` unless its deduplication key is already present.
    ///
    /// # Errors
    ///
    /// Returns [`AuditStoreError::Unavailable`] when the store cannot be
    /// reached.
    async fn append(&self, entry: &AuditEntry) -> AuditStoreResult<AppendOutcome>;

    /// Returns entries matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    async fn query(&self, query: &AuditQuery) -> AuditStoreResult<Vec<AuditEntry>>;

    /// Returns every entry for a request ordered by attempt, timestamp, and
    /// sequence.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    async fn find_by_request(&self, request_id: RequestId) -> AuditStoreResult<Vec<AuditEntry>>;

    /// Deletes entries whose retention expired at or before `now`.
    ///
    /// Returns the number of deleted entries.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be written.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AuditStoreResult<u64>;
}

/// Errors returned by audit store implementations.
#[derive(Debug, Clone, Error)]
pub enum AuditStoreError {
    /// The store cannot be reached.
    #[error("audit store unavailable: {0}")]
    Unavailable(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuditStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
