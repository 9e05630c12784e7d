//! In-memory audit store with secondary indexes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::audit::{
    domain::{AuditEntry, AuditQuery, DedupKey},
    ports::{AppendOutcome, AuditStore, AuditStoreError, AuditStoreResult},
};
use crate::request::{RequestId, UserId};

/// Thread-safe in-memory audit store.
///
/// Entries live in append order; user, action, and request indexes hold
/// positions into that log.
#[derive(Debug, Clone)]
pub struct InMemoryAuditStore {
    state: Arc<RwLock<AuditState>>,
    available: Arc<AtomicBool>,
}

#[derive(Debug, Default)]
struct AuditState {
    entries: Vec<AuditEntry>,
    keys: HashSet<DedupKey>,
    by_user: HashMap<UserId, Vec<usize>>,
    by_action: HashMap<String, Vec<usize>>,
    by_request: HashMap<RequestId, Vec<usize>>,
}

impl AuditState {
    fn push(&mut self, entry: AuditEntry) {
        let position = self.entries.len();
        self.keys.insert(entry.dedup_key());
        self.by_user
            .entry(entry.user_id().clone())
            .or_default()
            .push(position);
        self.by_action
            .entry(entry.action().to_owned())
            .or_default()
            .push(position);
        self.by_request
            .entry(entry.request_id())
            .or_default()
            .push(position);
        self.entries.push(entry);
    }

    fn resolve(&self, positions: &[usize]) -> Vec<&AuditEntry> {
        positions
            .iter()
            .filter_map(|position| self.entries.get(*position))
            .collect()
    }

    fn candidates(&self, query: &AuditQuery) -> Vec<&AuditEntry> {
        if let Some(user) = query.user_id() {
            return self
                .by_user
                .get(user)
                .map(|positions| self.resolve(positions))
                .unwrap_or_default();
        }
        if let Some(action) = query.action() {
            return self
                .by_action
                .get(action)
                .map(|positions| self.resolve(positions))
                .unwrap_or_default();
        }
        self.entries.iter().collect()
    }
}

impl Default for InMemoryAuditStore {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl InMemoryAuditStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail with [`AuditStoreError::Unavailable`]
    /// until re-enabled.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns the number of stored entries.
    ///
    /// # Errors
    ///
    /// Returns [`AuditStoreError::Persistence`] when the lock is poisoned.
    pub fn len(&self) -> AuditStoreResult<usize> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.entries.len())
    }

    /// Returns whether the store holds no entries.
    ///
    /// # Errors
    ///
    /// Returns [`AuditStoreError::Persistence`] when the lock is poisoned.
    pub fn is_empty(&self) -> AuditStoreResult<bool> {
        self.len().map(|count| count == 0)
    }

    fn ensure_available(&self) -> AuditStoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuditStoreError::Unavailable(
                "in-memory audit store disabled".to_owned(),
            ))
        }
    }
}

fn lock_error(err: impl std::fmt::Display) -> AuditStoreError {
    AuditStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, entry: &AuditEntry) -> AuditStoreResult<AppendOutcome> {
        self.ensure_available()?;
        let mut state = self.state.write().map_err(lock_error)?;
        if state.keys.contains(&entry.dedup_key()) {
            return Ok(AppendOutcome::Duplicate);
        }
        state.push(entry.clone());
        Ok(AppendOutcome::Inserted)
    }

    async fn query(&self, query: &AuditQuery) -> AuditStoreResult<Vec<AuditEntry>> {
        self.ensure_available()?;
        let state = self.state.read().map_err(lock_error)?;
        let mut matched: Vec<AuditEntry> = state
            .candidates(query)
            .into_iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect();
        matched.sort_by(|left, right| {
            right
                .timestamp()
                .cmp(&left.timestamp())
                .then_with(|| right.sequence().cmp(&left.sequence()))
        });
        if let Some(limit) = query.max_results() {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn find_by_request(&self, request_id: RequestId) -> AuditStoreResult<Vec<AuditEntry>> {
        self.ensure_available()?;
        let state = self.state.read().map_err(lock_error)?;
        let mut entries: Vec<AuditEntry> = state
            .by_request
            .get(&request_id)
            .map(|positions| state.resolve(positions))
            .unwrap_or_default()
            .into_iter()
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.attempt(), entry.timestamp(), entry.sequence()));
        Ok(entries)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AuditStoreResult<u64> {
        self.ensure_available()?;
        let mut state = self.state.write().map_err(lock_error)?;
        let before = state.entries.len();
        let retained: Vec<AuditEntry> = std::mem::take(&mut state.entries)
            .into_iter()
            .filter(|entry| entry.expires_at() > now)
            .collect();
        let purged = before.saturating_sub(retained.len());
        let mut rebuilt = AuditState::default();
        for entry in retained {
            rebuilt.push(entry);
        }
        *state = rebuilt;
        Ok(u64::try_from(purged).unwrap_or(u64::MAX))
    }
}
