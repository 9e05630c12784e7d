//! Integration tests for pattern analysis over dispatched traffic.

use std::sync::Arc;

use chrono::{Duration, Utc};
use mockable::DefaultClock;
use rstest::rstest;
use scriptorium::audit::{
    adapters::memory::InMemoryAuditStore, domain::AuditQuery, ports::AuditStore,
};
use scriptorium::config::PatternConfig;
use scriptorium::pattern::{
    adapters::memory::InMemoryPatternStore,
    domain::{Pattern, PatternType},
    ports::PatternStore,
    services::PatternAnalyzer,
};
use scriptorium::request::{AgentKind, Role};

use super::helpers::{Backends, Pipeline};

fn rejection_rate(patterns: &[Pattern], kind: AgentKind) -> Option<f64> {
    patterns
        .iter()
        .find(|pattern| {
            pattern.pattern_type() == PatternType::RejectionRate
                && pattern.agent_kind() == Some(kind)
        })
        .and_then(|pattern| pattern.metric().rejection_rate())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejection_rates_reflect_dispatched_outcomes() {
    let audit = Arc::new(InMemoryAuditStore::new());
    let succeeding = Pipeline::sharing(&Backends::citing(&["handbook.pdf"]), Arc::clone(&audit));
    let uncited = Pipeline::sharing(&Backends::default(), Arc::clone(&audit));

    for _ in 0..10 {
        let outcome = succeeding
            .dispatch(Role::WriteAccess, "create a 10 slide deck about Q2 results")
            .await;
        assert!(outcome.response.is_accepted());
    }
    for _ in 0..3 {
        let outcome = succeeding
            .dispatch(Role::ReadOnly, "summarize the uploaded document")
            .await;
        assert!(outcome.response.is_accepted());
    }
    for _ in 0..5 {
        let outcome = uncited
            .dispatch(Role::ReadOnly, "summarize the uploaded document")
            .await;
        assert!(!outcome.response.is_accepted());
    }

    let before = audit.query(&AuditQuery::new()).await.expect("audit readable");
    let patterns = Arc::new(InMemoryPatternStore::new());
    let analyzer = PatternAnalyzer::new(
        Arc::clone(&audit),
        Arc::clone(&patterns),
        Arc::new(DefaultClock),
        PatternConfig::default(),
    );
    let now = Utc::now() + Duration::seconds(1);

    let report = analyzer.run_once(now).await.expect("analysis succeeds");

    assert_eq!(report.requests_analyzed, 18);
    let current = patterns.current(now).await.expect("patterns readable");
    assert_eq!(rejection_rate(&current, AgentKind::Presentation), Some(0.0));
    assert_eq!(rejection_rate(&current, AgentKind::Document), Some(0.625));

    let after = audit.query(&AuditQuery::new()).await.expect("audit readable");
    assert_eq!(before, after);

    let insights = analyzer.insights(now).await.expect("insights");
    let flagged: Vec<AgentKind> = insights
        .recommendations
        .iter()
        .map(|recommendation| recommendation.agent_kind)
        .collect();
    assert_eq!(flagged, vec![AgentKind::Document]);
    assert_eq!(insights.requests_by_kind.get(&AgentKind::Document), Some(&8));
    assert_eq!(insights.requests_by_kind.get(&AgentKind::Presentation), Some(&10));
}
