//! Folding audit entries into per-request outcomes and per-kind aggregates.

use super::{ConfidenceBucket, NewPattern, PatternMetric};
use crate::audit::domain::AuditEntry;
use crate::dispatch::domain::PipelineState;
use crate::request::{AgentKind, RequestId};
use std::collections::BTreeMap;

/// Bucket edges for the confidence histogram.
const BUCKET_EDGES: [f64; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

/// Outcome of one request reconstructed from its audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    /// The request.
    pub request_id: RequestId,
    /// Kind that served, or would have served, the request.
    pub agent_kind: Option<AgentKind>,
    /// Terminal state, when one was recorded.
    pub terminal: Option<PipelineState>,
    /// Highest attempt number seen.
    pub attempts: u32,
    /// Classifier confidence, when recorded.
    pub classifier_confidence: Option<f64>,
}

/// Groups `entries` by request and reconstructs each outcome.
///
/// Entries may arrive in any order.
#[must_use]
pub fn summarize_requests(entries: &[AuditEntry]) -> Vec<RequestOutcome> {
    let mut outcomes: BTreeMap<RequestId, RequestOutcome> = BTreeMap::new();
    for entry in entries {
        let outcome = outcomes
            .entry(entry.request_id())
            .or_insert_with(|| RequestOutcome {
                request_id: entry.request_id(),
                agent_kind: None,
                terminal: None,
                attempts: 0,
                classifier_confidence: None,
            });
        let details = entry.details();
        outcome.attempts = outcome.attempts.max(entry.attempt());
        if let Some(kind) = details.agent_kind {
            outcome.agent_kind = Some(kind);
        } else if outcome.agent_kind.is_none() {
            outcome.agent_kind = details.effective_agent_kind();
        }
        if let Some(confidence) = details.confidence {
            outcome.classifier_confidence = Some(confidence);
        }
        if entry.is_terminal() {
            outcome.terminal = Some(details.transition.target());
        }
    }
    outcomes.into_values().collect()
}

/// Per-kind counters derived from request outcomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KindAggregate {
    /// Terminal requests.
    pub total: u32,
    /// Accepted requests.
    pub accepted: u32,
    /// Failed requests.
    pub failed: u32,
    /// Sum of attempt numbers over accepted requests.
    pub attempts_to_success: u32,
    /// Classifier confidence per terminal request.
    pub confidences: Vec<f64>,
    /// Terminal requests, in request order.
    pub evidence: Vec<RequestId>,
    /// Failed requests, in request order.
    pub failed_evidence: Vec<RequestId>,
}

impl KindAggregate {
    fn observe(&mut self, outcome: &RequestOutcome, terminal: PipelineState) {
        self.total = self.total.saturating_add(1);
        self.evidence.push(outcome.request_id);
        if terminal == PipelineState::Accepted {
            self.accepted = self.accepted.saturating_add(1);
            self.attempts_to_success = self.attempts_to_success.saturating_add(outcome.attempts);
        } else {
            self.failed = self.failed.saturating_add(1);
            self.failed_evidence.push(outcome.request_id);
        }
        if let Some(confidence) = outcome.classifier_confidence {
            self.confidences.push(confidence);
        }
    }

    /// Returns failed over terminal requests.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "rates are ratios of counts")]
    pub fn rejection_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| f64::from(self.failed) / f64::from(self.total))
    }

    /// Returns the mean attempt number of accepted requests.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "means are ratios of counts")]
    pub fn mean_attempts_to_success(&self) -> Option<f64> {
        (self.accepted > 0)
            .then(|| f64::from(self.attempts_to_success) / f64::from(self.accepted))
    }

    /// Returns the classifier confidence histogram.
    #[must_use]
    pub fn confidence_buckets(&self) -> Vec<ConfidenceBucket> {
        let mut buckets: Vec<ConfidenceBucket> = BUCKET_EDGES
            .windows(2)
            .filter_map(|edges| match edges {
                [lower, upper] => Some(ConfidenceBucket {
                    lower: *lower,
                    upper: *upper,
                    count: 0,
                }),
                _ => None,
            })
            .collect();
        let last = buckets.len().saturating_sub(1);
        for confidence in &self.confidences {
            let slot = buckets
                .iter()
                .position(|bucket| *confidence < bucket.upper)
                .unwrap_or(last);
            if let Some(bucket) = buckets.get_mut(slot) {
                bucket.count = bucket.count.saturating_add(1);
            }
        }
        buckets
    }

    /// Converts the aggregate into analyzer patterns for `kind`.
    #[must_use]
    pub fn into_patterns(self, kind: AgentKind) -> Vec<NewPattern> {
        let mut patterns = Vec::new();
        if let Some(rate) = self.rejection_rate() {
            let mut evidence = self.failed_evidence.clone();
            evidence.extend(
                self.evidence
                    .iter()
                    .filter(|id| !self.failed_evidence.contains(*id)),
            );
            patterns.push(NewPattern {
                agent_kind: Some(kind),
                metric: PatternMetric::RejectionRate {
                    rate,
                    failed: self.failed,
                    total: self.total,
                },
                sample_size: self.total,
                evidence,
            });
        }
        if let Some(mean_attempts) = self.mean_attempts_to_success() {
            patterns.push(NewPattern {
                agent_kind: Some(kind),
                metric: PatternMetric::AttemptsToSuccess {
                    mean_attempts,
                    accepted: self.accepted,
                },
                sample_size: self.accepted,
                evidence: Vec::new(),
            });
        }
        if !self.confidences.is_empty() {
            let sample_size = u32::try_from(self.confidences.len()).unwrap_or(u32::MAX);
            patterns.push(NewPattern {
                agent_kind: Some(kind),
                metric: PatternMetric::ConfidenceDistribution {
                    buckets: self.confidence_buckets(),
                },
                sample_size,
                evidence: Vec::new(),
            });
        }
        patterns
    }
}

/// Aggregates terminal outcomes per agent kind.
///
/// Requests without a terminal state or without a kind are skipped.
#[must_use]
pub fn aggregate_by_kind(outcomes: &[RequestOutcome]) -> BTreeMap<AgentKind, KindAggregate> {
    let mut aggregates: BTreeMap<AgentKind, KindAggregate> = BTreeMap::new();
    for outcome in outcomes {
        if let (Some(kind), Some(terminal)) = (outcome.agent_kind, outcome.terminal) {
            aggregates.entry(kind).or_default().observe(outcome, terminal);
        }
    }
    aggregates
}
