//! Unit tests for the pattern module.

mod aggregate_tests;

use crate::audit::domain::{AuditEntry, TransitionDetails, TransitionRecord};
use crate::dispatch::domain::{InvocationStatus, PipelineState};
use crate::request::{AgentKind, RequestId, RequestKind, UserId};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub(super) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Builds the audit trail of one request that ran `attempts` attempts and
/// ended accepted or failed.
pub(super) fn trail(
    kind: AgentKind,
    attempts: u32,
    accepted: bool,
    confidence: f64,
    hour: u32,
) -> Vec<AuditEntry> {
    let request_id = RequestId::new();
    let mut sequence = 0_u64;
    let mut entries = Vec::new();
    let mut push = |attempt: u32, details: TransitionDetails| {
        let record = TransitionRecord {
            request_id,
            user_id: UserId::new("ana").expect("valid user id"),
            attempt,
            sequence,
            details,
        };
        sequence += 1;
        entries.push(AuditEntry::new(record, at(hour), Duration::days(30)));
    };
    let step = |from: PipelineState, to: PipelineState| {
        TransitionDetails::new(from.transition(to).expect("permitted transition"))
    };

    push(
        0,
        step(PipelineState::Received, PipelineState::Classified)
            .with_request_kind(RequestKind::from(kind))
            .with_confidence(confidence, false),
    );
    push(
        0,
        step(PipelineState::Classified, PipelineState::AgentSelected).with_agent_kind(kind),
    );
    for attempt in 1..=attempts {
        let entering = if attempt == 1 {
            PipelineState::AgentSelected
        } else {
            PipelineState::Retrying
        };
        push(
            attempt,
            step(entering, PipelineState::Invoking).with_agent_kind(kind),
        );
        push(
            attempt,
            step(PipelineState::Invoking, PipelineState::Validating).with_agent_kind(kind),
        );
        if attempt < attempts {
            push(
                attempt,
                step(PipelineState::Validating, PipelineState::Retrying)
                    .with_agent_kind(kind)
                    .with_invocation_status(InvocationStatus::Rejected),
            );
        }
    }
    if accepted {
        push(
            attempts,
            step(PipelineState::Validating, PipelineState::Accepted)
                .with_agent_kind(kind)
                .with_invocation_status(InvocationStatus::Succeeded),
        );
    } else {
        push(
            attempts,
            step(PipelineState::Validating, PipelineState::Escalated).with_agent_kind(kind),
        );
        push(
            attempts,
            step(PipelineState::Escalated, PipelineState::Failed).with_agent_kind(kind),
        );
    }
    entries
}
