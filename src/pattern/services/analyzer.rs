//! Scheduled batch deriving patterns from the audit trail.

use crate::audit::{
    domain::AuditQuery,
    ports::{AuditStore, AuditStoreError},
};
use crate::config::PatternConfig;
use crate::pattern::{
    domain::{InsightSummary, Pattern, aggregate_by_kind, summarize_requests},
    ports::{PatternStore, PatternStoreError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors returned by the pattern analyzer.
#[derive(Debug, Clone, Error)]
pub enum AnalyzerError {
    /// The audit trail could not be read.
    #[error(transparent)]
    Audit(#[from] AuditStoreError),

    /// Patterns could not be read or written.
    #[error(transparent)]
    Patterns(#[from] PatternStoreError),
}

/// Result type for analyzer operations.
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Counters reported by one analyzer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisReport {
    /// Audit entries read.
    pub entries_read: usize,
    /// Distinct requests seen.
    pub requests_analyzed: usize,
    /// Patterns written.
    pub patterns_written: usize,
    /// Expired patterns deleted.
    pub patterns_purged: u64,
}

/// Derives advisory patterns from a trailing window of audit entries.
///
/// The analyzer only reads the audit store and only inserts into the
/// pattern store.
pub struct PatternAnalyzer<A, P, C>
where
    A: AuditStore,
    P: PatternStore,
    C: Clock + Send + Sync,
{
    audit: Arc<A>,
    patterns: Arc<P>,
    clock: Arc<C>,
    config: PatternConfig,
}

impl<A, P, C> PatternAnalyzer<A, P, C>
where
    A: AuditStore + 'static,
    P: PatternStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an analyzer over the given stores.
    #[must_use]
    pub const fn new(
        audit: Arc<A>,
        patterns: Arc<P>,
        clock: Arc<C>,
        config: PatternConfig,
    ) -> Self {
        Self {
            audit,
            patterns,
            clock,
            config,
        }
    }

    /// Runs one analysis at the current clock time.
    ///
    /// # Errors
    ///
    /// See [`Self::run_once`].
    pub async fn run(&self) -> AnalyzerResult<AnalysisReport> {
        self.run_once(self.clock.utc()).await
    }

    /// Analyzes audit entries in the window ending at `now`.
    ///
    /// Each new pattern supersedes the latest pattern of the same type and
    /// kind. Expired patterns are purged afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError`] when either store fails.
    pub async fn run_once(&self, now: DateTime<Utc>) -> AnalyzerResult<AnalysisReport> {
        let since = now
            .checked_sub_signed(self.config.window())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let entries = self
            .audit
            .query(&AuditQuery::new().since(since).until(now))
            .await?;
        let outcomes = summarize_requests(&entries);
        let aggregates = aggregate_by_kind(&outcomes);

        let mut report = AnalysisReport {
            entries_read: entries.len(),
            requests_analyzed: outcomes.len(),
            ..AnalysisReport::default()
        };
        for (kind, aggregate) in aggregates {
            for new_pattern in aggregate.into_patterns(kind) {
                let previous = self
                    .patterns
                    .latest(new_pattern.metric.pattern_type(), new_pattern.agent_kind)
                    .await?;
                let pattern = Pattern::discover(
                    new_pattern,
                    now,
                    self.config.retention(),
                    previous.as_ref().map(Pattern::id),
                );
                debug!(
                    pattern_type = %pattern.pattern_type(),
                    agent_kind = ?pattern.agent_kind(),
                    "writing pattern"
                );
                self.patterns.insert(&pattern).await?;
                report.patterns_written = report.patterns_written.saturating_add(1);
            }
        }
        report.patterns_purged = self.patterns.purge_expired(now).await?;

        info!(
            entries_read = report.entries_read,
            requests_analyzed = report.requests_analyzed,
            patterns_written = report.patterns_written,
            patterns_purged = report.patterns_purged,
            "pattern analysis complete"
        );
        Ok(report)
    }

    /// Summarizes current patterns at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Patterns`] when the pattern store fails.
    pub async fn insights(&self, now: DateTime<Utc>) -> AnalyzerResult<InsightSummary> {
        let current = self.patterns.current(now).await?;
        Ok(InsightSummary::from_patterns(
            &current,
            self.config.rejection_alert_threshold,
        ))
    }

    /// Runs [`Self::run`] on the configured interval until `token` is
    /// cancelled. Failures are logged and the schedule continues.
    #[must_use]
    pub fn spawn_scheduled(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let analyzer = Arc::clone(self);
        let period = self.config.interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = analyzer.run().await {
                            warn!(error = %err, "pattern analysis failed");
                        }
                    }
                }
            }
            debug!("pattern analyzer stopped");
        })
    }
}
