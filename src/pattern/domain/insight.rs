//! Insight summary served to administrators.

use super::{Pattern, PatternMetric, PatternType};
use crate::request::AgentKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of patterns reported as top insights.
pub const TOP_INSIGHTS: usize = 5;

/// Suggested follow-up for a kind whose rejection rate is too high.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// Affected kind.
    pub agent_kind: AgentKind,
    /// Observed rejection rate.
    pub rejection_rate: f64,
    /// Suggested action.
    pub message: String,
}

/// Aggregate view over current patterns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightSummary {
    /// Number of current patterns.
    pub total_patterns: usize,
    /// Current patterns per type.
    pub patterns_by_type: BTreeMap<PatternType, usize>,
    /// Mean confidence score over current patterns.
    pub average_confidence: f64,
    /// Highest-confidence patterns, best first.
    pub top_insights: Vec<Pattern>,
    /// Terminal request counts per kind.
    pub requests_by_kind: BTreeMap<AgentKind, u32>,
    /// Kinds whose rejection rate exceeds the alert threshold.
    pub recommendations: Vec<Recommendation>,
}

impl InsightSummary {
    /// Summarizes `patterns`, recommending review for kinds whose
    /// rejection rate exceeds `alert_threshold`.
    #[must_use]
    pub fn from_patterns(patterns: &[Pattern], alert_threshold: f64) -> Self {
        let mut patterns_by_type: BTreeMap<PatternType, usize> = BTreeMap::new();
        let mut requests_by_kind: BTreeMap<AgentKind, u32> = BTreeMap::new();
        let mut recommendations = Vec::new();
        for pattern in patterns {
            let count = patterns_by_type.entry(pattern.pattern_type()).or_default();
            *count = count.saturating_add(1);
            if let (Some(kind), PatternMetric::RejectionRate { rate, total, .. }) =
                (pattern.agent_kind(), pattern.metric())
            {
                requests_by_kind.insert(kind, *total);
                if *rate > alert_threshold {
                    recommendations.push(Recommendation {
                        agent_kind: kind,
                        rejection_rate: *rate,
                        message: format!(
                            "{kind} requests fail at rate {rate:.2}; review the handler \
                             inputs and escalation settings"
                        ),
                    });
                }
            }
        }

        let mut ranked: Vec<Pattern> = patterns.to_vec();
        ranked.sort_by(|left, right| {
            right
                .confidence_score()
                .total_cmp(&left.confidence_score())
                .then_with(|| right.discovered_at().cmp(&left.discovered_at()))
        });
        ranked.truncate(TOP_INSIGHTS);
        recommendations.sort_by(|left, right| right.rejection_rate.total_cmp(&left.rejection_rate));

        Self {
            total_patterns: patterns.len(),
            patterns_by_type,
            average_confidence: average_confidence(patterns),
            top_insights: ranked,
            requests_by_kind,
            recommendations,
        }
    }
}

#[expect(clippy::float_arithmetic, reason = "averaging confidence scores")]
fn average_confidence(patterns: &[Pattern]) -> f64 {
    let Ok(count) = u32::try_from(patterns.len()) else {
        return 0.0;
    };
    if count == 0 {
        return 0.0;
    }
    let sum: f64 = patterns.iter().map(Pattern::confidence_score).sum();
    sum / f64::from(count)
}
