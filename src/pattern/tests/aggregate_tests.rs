//! Tests for audit aggregation into per-kind metrics.

use super::trail;
use crate::pattern::domain::{PatternMetric, aggregate_by_kind, summarize_requests};
use crate::request::AgentKind;
use rstest::rstest;

#[rstest]
fn outcomes_capture_kind_terminal_and_attempts() {
    let entries = trail(AgentKind::Document, 3, false, 0.7, 9);

    let outcomes = summarize_requests(&entries);

    assert_eq!(outcomes.len(), 1);
    let outcome = outcomes.first().expect("one outcome");
    assert_eq!(outcome.agent_kind, Some(AgentKind::Document));
    assert_eq!(
        outcome.terminal,
        Some(crate::dispatch::domain::PipelineState::Failed)
    );
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.classifier_confidence, Some(0.7));
}

#[rstest]
fn in_flight_requests_are_not_aggregated() {
    let mut entries = trail(AgentKind::Chat, 1, true, 0.9, 9);
    entries.pop();

    let aggregates = aggregate_by_kind(&summarize_requests(&entries));

    assert!(aggregates.is_empty());
}

#[rstest]
fn mean_attempts_counts_only_accepted_requests() {
    let mut entries = trail(AgentKind::Document, 1, true, 0.9, 9);
    entries.extend(trail(AgentKind::Document, 2, true, 0.9, 9));
    entries.extend(trail(AgentKind::Document, 3, false, 0.9, 9));

    let aggregates = aggregate_by_kind(&summarize_requests(&entries));
    let document = aggregates.get(&AgentKind::Document).expect("document aggregate");

    assert_eq!(document.mean_attempts_to_success(), Some(1.5));
    assert_eq!(document.total, 3);
    assert_eq!(document.failed, 1);
}

#[rstest]
#[case(0.05, 0)]
#[case(0.2, 1)]
#[case(0.55, 2)]
#[case(0.79, 3)]
#[case(1.0, 4)]
fn confidence_lands_in_expected_bucket(#[case] confidence: f64, #[case] bucket: usize) {
    let entries = trail(AgentKind::Chat, 1, true, confidence, 9);
    let aggregates = aggregate_by_kind(&summarize_requests(&entries));
    let chat = aggregates.get(&AgentKind::Chat).expect("chat aggregate");

    let counts: Vec<u32> = chat
        .confidence_buckets()
        .iter()
        .map(|entry| entry.count)
        .collect();

    assert_eq!(counts.len(), 5);
    assert_eq!(counts.get(bucket), Some(&1));
    assert_eq!(counts.iter().sum::<u32>(), 1);
}

#[rstest]
fn aggregate_yields_one_pattern_per_metric() {
    let entries = trail(AgentKind::Presentation, 1, true, 0.9, 9);
    let aggregates = aggregate_by_kind(&summarize_requests(&entries));
    let presentation = aggregates
        .get(&AgentKind::Presentation)
        .cloned()
        .expect("presentation aggregate");

    let patterns = presentation.into_patterns(AgentKind::Presentation);

    assert_eq!(patterns.len(), 3);
    assert!(matches!(
        patterns.first().map(|pattern| &pattern.metric),
        Some(PatternMetric::RejectionRate { failed: 0, total: 1, .. })
    ));
}
