//! Integration tests for the dispatch pipeline's acceptance scenarios.
//!
//! Each test drives a request from submission to a terminal state and
//! checks the caller response, the invocation records, and the audit trail.

use super::helpers::{Backends, Pipeline, backends, caller};
use rstest::rstest;
use scriptorium::agent::{
    adapters::memory::ScriptedFieldExtractor, domain::ObjectKey, ports::ObjectStore,
};
use scriptorium::audit::domain::AuditEventType;
use scriptorium::dispatch::domain::{DispatchStatus, InboundRequest, InvocationStatus};
use scriptorium::request::{AgentKind, RequestMode, Role};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deck_request_is_generated_stored_and_accepted(backends: Backends) {
    let pipeline = Pipeline::new(&backends);

    let outcome = pipeline
        .dispatch(Role::WriteAccess, "create a 10 slide deck about Q2 results")
        .await;

    let response = &outcome.response;
    assert_eq!(response.status, DispatchStatus::Accepted);
    assert_eq!(response.agent_kind_used, Some(AgentKind::Presentation));
    assert_eq!(response.attempts, 1);

    let reference = response
        .result_reference
        .as_deref()
        .expect("deck reference returned");
    assert!(reference.ends_with(".deck.json"));
    let key = ObjectKey::parse(reference).expect("valid key");
    let bytes = pipeline.objects.get(&key).await.expect("deck retrievable");
    let deck: serde_json::Value = serde_json::from_slice(&bytes).expect("deck is JSON");
    assert_eq!(deck["title"], "Q2 results");

    let trail = pipeline.trail(response.request_id).await;
    let events: Vec<AuditEventType> = trail.iter().map(|entry| entry.event_type()).collect();
    assert_eq!(
        events,
        vec![
            AuditEventType::Classification,
            AuditEventType::AgentSelection,
            AuditEventType::Invocation,
            AuditEventType::Validation,
            AuditEventType::Completion,
        ]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn uncited_answer_is_retried_with_broader_retrieval_then_failed(backends: Backends) {
    let pipeline = Pipeline::new(&backends);

    let outcome = pipeline
        .dispatch(Role::ReadOnly, "summarize the uploaded document")
        .await;

    assert_eq!(outcome.response.status, DispatchStatus::Failed);
    assert_eq!(outcome.response.reasons, vec!["no citations".to_owned()]);
    let attempts: Vec<u32> = outcome
        .invocations
        .iter()
        .map(|invocation| invocation.attempt_number())
        .collect();
    assert_eq!(attempts, vec![1, 2, 3]);

    let top_k: Vec<usize> = backends
        .retriever
        .queries()
        .iter()
        .map(|query| query.top_k)
        .collect();
    assert_eq!(top_k, vec![5, 10, 20]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cited_answer_is_accepted_with_text() {
    let backends = Backends::citing(&["handbook.pdf"]);
    let pipeline = Pipeline::new(&backends);

    let outcome = pipeline
        .dispatch(Role::ReadOnly, "summarize the uploaded document")
        .await;

    assert_eq!(outcome.response.status, DispatchStatus::Accepted);
    assert_eq!(outcome.response.text.as_deref(), Some("Scripted answer."));
    assert_eq!(
        outcome.response.tools_used,
        vec![
            "content_generation".to_owned(),
            "knowledge_base_search".to_owned()
        ]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn freeform_mode_accepts_an_uncited_answer(backends: Backends) {
    let pipeline = Pipeline::new(&backends);
    let inbound = InboundRequest {
        instructions: "summarize the uploaded document".to_owned(),
        files: Vec::new(),
        mode: RequestMode::Freeform,
        caller: caller("ana", Role::ReadOnly),
    };

    let outcome = pipeline
        .dispatcher
        .submit(inbound, CancellationToken::new())
        .await
        .expect("well-formed request");

    assert_eq!(outcome.response.status, DispatchStatus::Accepted);
    assert_eq!(outcome.response.attempts, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_schema_field_is_terminal_after_one_attempt() {
    let backends = Backends {
        extractor: Arc::new(ScriptedFieldExtractor::returning([("total_loans", 10.0)])),
        ..Backends::default()
    };
    let pipeline = Pipeline::new(&backends);

    let outcome = pipeline
        .dispatch(Role::WriteAccess, "extract the loan portfolio figures")
        .await;

    assert_eq!(outcome.response.status, DispatchStatus::Failed);
    assert_eq!(outcome.response.attempts, 1);
    assert!(outcome.response.fields.is_none());
    let invocation = outcome.invocations.first().expect("one invocation");
    assert_eq!(invocation.status(), InvocationStatus::Rejected);
    let trail = pipeline.trail(outcome.response.request_id).await;
    assert!(
        trail
            .iter()
            .all(|entry| entry.event_type() != AuditEventType::Retry)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn audit_outage_degrades_the_response_until_reconciled(backends: Backends) {
    let pipeline = Pipeline::new(&backends);
    pipeline.audit.set_available(false);

    let outcome = pipeline
        .dispatch(Role::ReadOnly, "hello there, how are you")
        .await;

    assert_eq!(outcome.response.status, DispatchStatus::Accepted);
    assert_eq!(outcome.response.agent_kind_used, Some(AgentKind::Chat));
    assert!(outcome.response.audit_degraded);

    pipeline.audit.set_available(true);
    assert!(pipeline.trail(outcome.response.request_id).await.is_empty());
    let recorder = pipeline.dispatcher.recorder();
    let flushed = recorder.reconcile().await.expect("store recovered");

    assert_eq!(flushed, 5);
    let trail = pipeline.trail(outcome.response.request_id).await;
    assert_eq!(trail.len(), 5);
    let last = trail.last().expect("terminal entry");
    assert!(last.is_terminal());
}
