//! Pattern store port.

use crate::pattern::domain::{Pattern, PatternType};
use crate::request::AgentKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for pattern store operations.
pub type PatternStoreResult<T> = Result<T, PatternStoreError>;

/// Insert-only store of analyzer patterns.
#[async_trait]
pub trait PatternStore: Send + Sync {
    /// Inserts a new pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternStoreError::Duplicate`] when the identifier exists.
    async fn insert(&self, pattern: &Pattern) -> PatternStoreResult<()>;

    /// Returns the newest pattern for a type and kind, expired or not.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    async fn latest(
        &self,
        pattern_type: PatternType,
        agent_kind: Option<AgentKind>,
    ) -> PatternStoreResult<Option<Pattern>>;

    /// Returns unexpired patterns that no other pattern supersedes.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    async fn current(&self, now: DateTime<Utc>) -> PatternStoreResult<Vec<Pattern>>;

    /// Deletes patterns whose retention expired at or before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be written.
    async fn purge_expired(&self, now: DateTime<Utc>) -> PatternStoreResult<u64>;
}

/// Errors returned by pattern store implementations.
#[derive(Debug, Clone, Error)]
pub enum PatternStoreError {
    /// A pattern with the same identifier already exists.
    #[error("duplicate pattern identifier: {0}")]
    Duplicate(crate::pattern::domain::PatternId),

    /// The store cannot be reached.
    #[error("pattern store unavailable: {0}")]
    Unavailable(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl PatternStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
