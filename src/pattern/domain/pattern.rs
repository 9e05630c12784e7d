//! Pattern record model.

use crate::request::{AgentKind, RequestId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Sample size at which a pattern's confidence saturates.
const SATURATING_SAMPLE: u32 = 20;

/// Maximum number of evidence references kept per pattern.
pub const MAX_EVIDENCE: usize = 20;

/// Unique identifier of one pattern record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternId(Uuid);

impl PatternId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for PatternId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aggregate computed by a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Share of terminal requests that failed.
    RejectionRate,
    /// Mean attempt number of accepted requests.
    AttemptsToSuccess,
    /// Histogram of classifier confidence.
    ConfidenceDistribution,
}

impl PatternType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RejectionRate => "rejection_rate",
            Self::AttemptsToSuccess => "attempts_to_success",
            Self::ConfidenceDistribution => "confidence_distribution",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PatternType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "rejection_rate" => Ok(Self::RejectionRate),
            "attempts_to_success" => Ok(Self::AttemptsToSuccess),
            "confidence_distribution" => Ok(Self::ConfidenceDistribution),
            other => Err(format!("unknown pattern type: {other}")),
        }
    }
}

/// One histogram bucket over `[lower, upper)`; the last bucket includes 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBucket {
    /// Inclusive lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
    /// Number of requests in the bucket.
    pub count: u32,
}

/// Measured value of a pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternMetric {
    /// Failed requests over terminal requests.
    RejectionRate {
        /// Computed rate in `[0, 1]`.
        rate: f64,
        /// Failed requests.
        failed: u32,
        /// Terminal requests.
        total: u32,
    },
    /// Mean attempts needed by accepted requests.
    AttemptsToSuccess {
        /// Mean attempt number.
        mean_attempts: f64,
        /// Accepted requests.
        accepted: u32,
    },
    /// Classifier confidence histogram.
    ConfidenceDistribution {
        /// Buckets in ascending order.
        buckets: Vec<ConfidenceBucket>,
    },
}

impl PatternMetric {
    /// Returns the pattern type measured by this metric.
    #[must_use]
    pub const fn pattern_type(&self) -> PatternType {
        match self {
            Self::RejectionRate { .. } => PatternType::RejectionRate,
            Self::AttemptsToSuccess { .. } => PatternType::AttemptsToSuccess,
            Self::ConfidenceDistribution { .. } => PatternType::ConfidenceDistribution,
        }
    }

    /// Returns the rejection rate when this is a rejection-rate metric.
    #[must_use]
    pub const fn rejection_rate(&self) -> Option<f64> {
        match self {
            Self::RejectionRate { rate, .. } => Some(*rate),
            Self::AttemptsToSuccess { .. } | Self::ConfidenceDistribution { .. } => None,
        }
    }

    fn describe(&self, kind: Option<AgentKind>) -> String {
        let subject = kind.map_or("all", AgentKind::as_str);
        match self {
            Self::RejectionRate {
                rate,
                failed,
                total,
            } => format!("{subject} requests failed at rate {rate:.3} ({failed} of {total})"),
            Self::AttemptsToSuccess {
                mean_attempts,
                accepted,
            } => format!(
                "{subject} requests needed {mean_attempts:.2} attempts on average \
                 ({accepted} accepted)"
            ),
            Self::ConfidenceDistribution { buckets } => {
                let counts: Vec<String> = buckets
                    .iter()
                    .map(|bucket| {
                        format!("{:.1}-{:.1}: {}", bucket.lower, bucket.upper, bucket.count)
                    })
                    .collect();
                format!("{subject} classifier confidence {}", counts.join(", "))
            }
        }
    }
}

/// Analyzer output before it is stamped and linked to its predecessor.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPattern {
    /// Kind the pattern describes; `None` for cross-kind patterns.
    pub agent_kind: Option<AgentKind>,
    /// Measured value.
    pub metric: PatternMetric,
    /// Number of requests behind the measurement.
    pub sample_size: u32,
    /// Requests supporting the measurement.
    pub evidence: Vec<RequestId>,
}

/// Stored representation used when rehydrating patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedPattern {
    /// Pattern identifier.
    pub id: PatternId,
    /// Analyzer run timestamp.
    pub discovered_at: DateTime<Utc>,
    /// Kind the pattern describes.
    pub agent_kind: Option<AgentKind>,
    /// Human-readable summary.
    pub description: String,
    /// Evidence strength in `[0, 1]`.
    pub confidence_score: f64,
    /// Measured value.
    pub metric: PatternMetric,
    /// Number of requests behind the measurement.
    pub sample_size: u32,
    /// Requests supporting the measurement.
    pub evidence: Vec<RequestId>,
    /// Pattern replaced by this one.
    pub supersedes: Option<PatternId>,
    /// Retention expiry.
    pub expires_at: DateTime<Utc>,
}

/// Immutable aggregate insight written by one analyzer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    id: PatternId,
    discovered_at: DateTime<Utc>,
    pattern_type: PatternType,
    agent_kind: Option<AgentKind>,
    description: String,
    confidence_score: f64,
    metric: PatternMetric,
    sample_size: u32,
    evidence: Vec<RequestId>,
    supersedes: Option<PatternId>,
    expires_at: DateTime<Utc>,
}

impl Pattern {
    /// Stamps `new` as discovered at `discovered_at`, replacing
    /// `supersedes` when given.
    #[must_use]
    pub fn discover(
        new: NewPattern,
        discovered_at: DateTime<Utc>,
        retention: Duration,
        supersedes: Option<PatternId>,
    ) -> Self {
        let NewPattern {
            agent_kind,
            metric,
            sample_size,
            mut evidence,
        } = new;
        evidence.truncate(MAX_EVIDENCE);
        Self {
            id: PatternId::new(),
            discovered_at,
            pattern_type: metric.pattern_type(),
            agent_kind,
            description: metric.describe(agent_kind),
            confidence_score: sample_confidence(sample_size),
            metric,
            sample_size,
            evidence,
            supersedes,
            expires_at: discovered_at
                .checked_add_signed(retention)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Rehydrates a pattern from storage.
    #[must_use]
    pub fn from_persisted(data: PersistedPattern) -> Self {
        Self {
            id: data.id,
            discovered_at: data.discovered_at,
            pattern_type: data.metric.pattern_type(),
            agent_kind: data.agent_kind,
            description: data.description,
            confidence_score: data.confidence_score,
            metric: data.metric,
            sample_size: data.sample_size,
            evidence: data.evidence,
            supersedes: data.supersedes,
            expires_at: data.expires_at,
        }
    }

    /// Returns the pattern identifier.
    #[must_use]
    pub const fn id(&self) -> PatternId {
        self.id
    }

    /// Returns the analyzer run timestamp.
    #[must_use]
    pub const fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }

    /// Returns the pattern type.
    #[must_use]
    pub const fn pattern_type(&self) -> PatternType {
        self.pattern_type
    }

    /// Returns the described kind.
    #[must_use]
    pub const fn agent_kind(&self) -> Option<AgentKind> {
        self.agent_kind
    }

    /// Returns the human-readable summary.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the evidence strength in `[0, 1]`.
    #[must_use]
    pub const fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    /// Returns the measured value.
    #[must_use]
    pub const fn metric(&self) -> &PatternMetric {
        &self.metric
    }

    /// Returns the number of requests behind the measurement.
    #[must_use]
    pub const fn sample_size(&self) -> u32 {
        self.sample_size
    }

    /// Returns the supporting request references.
    #[must_use]
    pub fn evidence(&self) -> &[RequestId] {
        &self.evidence
    }

    /// Returns the replaced pattern.
    #[must_use]
    pub const fn supersedes(&self) -> Option<PatternId> {
        self.supersedes
    }

    /// Returns the retention expiry.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns whether the pattern is past retention at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "confidence scales linearly with sample size"
)]
fn sample_confidence(sample_size: u32) -> f64 {
    let capped = sample_size.min(SATURATING_SAMPLE);
    f64::from(capped) / f64::from(SATURATING_SAMPLE)
}
