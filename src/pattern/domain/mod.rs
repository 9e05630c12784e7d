//! Pattern records, audit aggregation, and insight summaries.

mod aggregate;
mod insight;
mod pattern;

pub use aggregate::{KindAggregate, RequestOutcome, aggregate_by_kind, summarize_requests};
pub use insight::{InsightSummary, Recommendation};
pub use pattern::{
    ConfidenceBucket, NewPattern, Pattern, PatternId, PatternMetric, PatternType,
    PersistedPattern,
};
