//! Bounded-latency audit writer with a reconciliation queue.

use crate::audit::{
    domain::{AuditEntry, TransitionRecord},
    ports::{AppendOutcome, AuditStore, AuditStoreError, AuditStoreResult},
};
use crate::config::OrchestratorConfig;
use mockable::Clock;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of recording one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The entry was written.
    Persisted,
    /// The entry had already been written.
    Duplicate,
    /// The write failed and the entry awaits reconciliation.
    Queued,
}

impl RecordOutcome {
    /// Returns whether the caller should be flagged audit-degraded.
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(self, Self::Queued)
    }
}

/// Writes audit entries with a bounded timeout and retries failures in the
/// background.
///
/// Queued entries keep their original timestamp and sequence, so readers
/// ordering by attempt, timestamp, and sequence see them in place once they
/// land.
pub struct AuditRecorder<S, C>
where
    S: AuditStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    write_timeout: Duration,
    retention: chrono::Duration,
    pending: Mutex<VecDeque<AuditEntry>>,
}

impl<S, C> AuditRecorder<S, C>
where
    S: AuditStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a recorder with explicit write timeout and retention.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        clock: Arc<C>,
        write_timeout: Duration,
        retention: chrono::Duration,
    ) -> Self {
        Self {
            store,
            clock,
            write_timeout,
            retention,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Creates a recorder configured from `config`.
    #[must_use]
    pub fn from_config(store: Arc<S>, clock: Arc<C>, config: &OrchestratorConfig) -> Self {
        Self::new(
            store,
            clock,
            config.audit_write_timeout(),
            config.audit().retention(),
        )
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Stamps `record` and writes it, queueing it on failure.
    pub async fn record(&self, record: TransitionRecord) -> RecordOutcome {
        let entry = AuditEntry::new(record, self.clock.utc(), self.retention);
        match self.write(&entry).await {
            Ok(AppendOutcome::Inserted) => RecordOutcome::Persisted,
            Ok(AppendOutcome::Duplicate) => {
                debug!(
                    request_id = %entry.request_id(),
                    action = entry.action(),
                    "audit entry already present"
                );
                RecordOutcome::Duplicate
            }
            Err(err) => {
                warn!(
                    request_id = %entry.request_id(),
                    attempt = entry.attempt(),
                    action = entry.action(),
                    error = %err,
                    "audit write failed; queued for reconciliation"
                );
                self.pending.lock().await.push_back(entry);
                RecordOutcome::Queued
            }
        }
    }

    /// Returns the number of entries awaiting reconciliation.
    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Flushes queued entries in order, stopping at the first failure.
    ///
    /// The queue is drained before writing, so `record` and `pending_len`
    /// never wait on a flush. Returns the number of entries removed from
    /// the queue. Entries the store already holds count as flushed.
    ///
    /// # Errors
    ///
    /// Returns the store error that halted the flush; unflushed entries
    /// go back to the front of the queue in their original order.
    pub async fn reconcile(&self) -> AuditStoreResult<usize> {
        let batch = std::mem::take(&mut *self.pending.lock().await);
        let mut remaining = batch.into_iter();
        let mut flushed = 0_usize;
        let mut halted = None;
        for entry in remaining.by_ref() {
            if let Err(err) = self.write(&entry).await {
                halted = Some((entry, err));
                break;
            }
            flushed = flushed.saturating_add(1);
        }
        if flushed > 0 {
            info!(flushed, "reconciled queued audit entries");
        }
        let Some((entry, err)) = halted else {
            return Ok(flushed);
        };
        let mut pending = self.pending.lock().await;
        for unflushed in std::iter::once(entry).chain(remaining).rev() {
            pending.push_front(unflushed);
        }
        Err(err)
    }

    /// Deletes entries past retention.
    ///
    /// # Errors
    ///
    /// Returns the store error when the purge fails.
    pub async fn purge_expired(&self) -> AuditStoreResult<u64> {
        self.store.purge_expired(self.clock.utc()).await
    }

    /// Runs [`Self::reconcile`] every `interval` until `token` is cancelled.
    #[must_use]
    pub fn spawn_reconciler(
        self: &Arc<Self>,
        interval: Duration,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let recorder = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = recorder.reconcile().await {
                            warn!(error = %err, "audit reconciliation halted");
                        }
                    }
                }
            }
            debug!("audit reconciler stopped");
        })
    }

    async fn write(&self, entry: &AuditEntry) -> AuditStoreResult<AppendOutcome> {
        tokio::time::timeout(self.write_timeout, self.store.append(entry))
            .await
            .map_err(|_| AuditStoreError::Unavailable("audit write timed out".to_owned()))?
    }
}
