//! Integration tests for pipeline-wide invariants.

use std::collections::BTreeSet;
use std::sync::Arc;

use rstest::rstest;
use scriptorium::audit::{
    domain::AuditQuery,
    ports::{AppendOutcome, AuditStore},
};
use scriptorium::dispatch::domain::{DispatchOutcome, InvocationStatus};
use scriptorium::request::Role;
use tokio::task::JoinSet;

use super::helpers::{Backends, Pipeline};

const MIXED_TRAFFIC: [(Role, &str); 6] = [
    (Role::WriteAccess, "create a 10 slide deck about Q2 results"),
    (Role::ReadOnly, "summarize the uploaded document"),
    (Role::WriteAccess, "extract the loan portfolio figures"),
    (Role::ReadOnly, "hello there, how are you"),
    (Role::ReadOnly, "create a 10 slide deck about Q2 results"),
    (Role::ReadOnly, "what is the latest news today"),
];

async fn run_mixed_traffic(pipeline: &Arc<Pipeline>) -> Vec<DispatchOutcome> {
    let mut tasks = JoinSet::new();
    for _ in 0..3 {
        for (role, text) in MIXED_TRAFFIC {
            let shared = Arc::clone(pipeline);
            tasks.spawn(async move { shared.dispatch(role, text).await });
        }
    }
    let mut outcomes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined.expect("dispatch task completes"));
    }
    outcomes
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn attempts_never_exceed_the_configured_bound() {
    let pipeline = Arc::new(Pipeline::new(&Backends::default()));

    let outcomes = run_mixed_traffic(&pipeline).await;

    assert_eq!(outcomes.len(), 18);
    for outcome in &outcomes {
        assert!(outcome.response.attempts <= 3);
        assert_eq!(
            usize::try_from(outcome.response.attempts).expect("small"),
            outcome.invocations.len()
        );
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accepted_requests_have_exactly_one_success() {
    let pipeline = Arc::new(Pipeline::new(&Backends::citing(&["handbook.pdf"])));

    let outcomes = run_mixed_traffic(&pipeline).await;

    for outcome in &outcomes {
        let succeeded = outcome
            .invocations
            .iter()
            .filter(|invocation| invocation.status() == InvocationStatus::Succeeded)
            .count();
        let expected = usize::from(outcome.response.is_accepted());
        assert_eq!(succeeded, expected);

        let attempts: BTreeSet<u32> = outcome
            .invocations
            .iter()
            .map(|invocation| invocation.attempt_number())
            .collect();
        assert_eq!(attempts.len(), outcome.invocations.len());
        if let Some(last) = outcome.invocations.last()
            && outcome.response.is_accepted()
        {
            assert_eq!(last.status(), InvocationStatus::Succeeded);
        }
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn every_request_has_one_terminal_entry() {
    let pipeline = Arc::new(Pipeline::new(&Backends::default()));

    let outcomes = run_mixed_traffic(&pipeline).await;

    for outcome in &outcomes {
        let trail = pipeline.trail(outcome.response.request_id).await;
        let terminal = trail.iter().filter(|entry| entry.is_terminal()).count();
        assert_eq!(terminal, 1);
        let last = trail.last().expect("non-empty trail");
        assert!(last.is_terminal());
        let sequences: Vec<u64> = trail.iter().map(|entry| entry.sequence()).collect();
        let mut sorted = sequences.clone();
        sorted.sort_unstable();
        assert_eq!(sequences, sorted);
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replayed_audit_writes_are_idempotent() {
    let pipeline = Arc::new(Pipeline::new(&Backends::default()));
    run_mixed_traffic(&pipeline).await;
    let recorded = pipeline
        .audit
        .query(&AuditQuery::new())
        .await
        .expect("audit readable");

    for entry in &recorded {
        let outcome = pipeline.audit.append(entry).await.expect("append");
        assert_eq!(outcome, AppendOutcome::Duplicate);
    }

    let replayed = pipeline
        .audit
        .query(&AuditQuery::new())
        .await
        .expect("audit readable");
    assert_eq!(replayed.len(), recorded.len());
}
