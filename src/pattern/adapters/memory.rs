//! In-memory pattern store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::pattern::{
    domain::{Pattern, PatternId, PatternType},
    ports::{PatternStore, PatternStoreError, PatternStoreResult},
};
use crate::request::AgentKind;

/// Thread-safe in-memory pattern store.
#[derive(Debug, Clone)]
pub struct InMemoryPatternStore {
    patterns: Arc<RwLock<Vec<Pattern>>>,
    available: Arc<AtomicBool>,
}

impl Default for InMemoryPatternStore {
    fn default() -> Self {
        Self {
            patterns: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl InMemoryPatternStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail with [`PatternStoreError::Unavailable`]
    /// until re-enabled.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns every stored pattern, superseded ones included.
    ///
    /// # Errors
    ///
    /// Returns [`PatternStoreError::Persistence`] when the lock is poisoned.
    pub fn all(&self) -> PatternStoreResult<Vec<Pattern>> {
        let patterns = self.patterns.read().map_err(lock_error)?;
        Ok(patterns.clone())
    }

    fn ensure_available(&self) -> PatternStoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PatternStoreError::Unavailable(
                "in-memory pattern store disabled".to_owned(),
            ))
        }
    }
}

fn lock_error(err: impl std::fmt::Display) -> PatternStoreError {
    PatternStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl PatternStore for InMemoryPatternStore {
    async fn insert(&self, pattern: &Pattern) -> PatternStoreResult<()> {
        self.ensure_available()?;
        let mut patterns = self.patterns.write().map_err(lock_error)?;
        if patterns.iter().any(|stored| stored.id() == pattern.id()) {
            return Err(PatternStoreError::Duplicate(pattern.id()));
        }
        patterns.push(pattern.clone());
        Ok(())
    }

    async fn latest(
        &self,
        pattern_type: PatternType,
        agent_kind: Option<AgentKind>,
    ) -> PatternStoreResult<Option<Pattern>> {
        self.ensure_available()?;
        let patterns = self.patterns.read().map_err(lock_error)?;
        Ok(patterns
            .iter()
            .filter(|pattern| {
                pattern.pattern_type() == pattern_type && pattern.agent_kind() == agent_kind
            })
            .max_by_key(|pattern| pattern.discovered_at())
            .cloned())
    }

    async fn current(&self, now: DateTime<Utc>) -> PatternStoreResult<Vec<Pattern>> {
        self.ensure_available()?;
        let patterns = self.patterns.read().map_err(lock_error)?;
        let superseded: HashSet<PatternId> =
            patterns.iter().filter_map(Pattern::supersedes).collect();
        Ok(patterns
            .iter()
            .filter(|pattern| !superseded.contains(&pattern.id()) && !pattern.is_expired(now))
            .cloned()
            .collect())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> PatternStoreResult<u64> {
        self.ensure_available()?;
        let mut patterns = self.patterns.write().map_err(lock_error)?;
        let before = patterns.len();
        patterns.retain(|pattern| !pattern.is_expired(now));
        let purged = before.saturating_sub(patterns.len());
        Ok(u64::try_from(purged).unwrap_or(u64::MAX))
    }
}
