//! Then steps for request dispatch BDD scenarios.

use super::world::{DispatchWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::then;
use scriptorium::audit::{domain::AuditEntry, ports::AuditStore};
use scriptorium::dispatch::domain::{DispatchOutcome, DispatchStatus, PipelineState};
use scriptorium::request::AgentKind;

fn outcome(world: &DispatchWorld) -> Result<&DispatchOutcome, eyre::Report> {
    world
        .outcome
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing dispatch outcome"))
}

fn trail(world: &DispatchWorld) -> Result<Vec<AuditEntry>, eyre::Report> {
    let request_id = outcome(world)?.response.request_id;
    run_async(world.audit.find_by_request(request_id)).wrap_err("read audit trail")
}

#[then(r#"the request is accepted by the "{kind}" agent"#)]
fn accepted_by(world: &DispatchWorld, kind: String) -> Result<(), eyre::Report> {
    let expected =
        AgentKind::try_from(kind.as_str()).map_err(|err| eyre::eyre!("invalid kind: {err}"))?;
    let response = &outcome(world)?.response;
    if response.status != DispatchStatus::Accepted {
        return Err(eyre::eyre!(
            "expected acceptance, got {:?} with reasons {:?}",
            response.status,
            response.reasons
        ));
    }
    if response.agent_kind_used != Some(expected) {
        return Err(eyre::eyre!(
            "expected agent {expected}, got {:?}",
            response.agent_kind_used
        ));
    }
    Ok(())
}

#[then(r#"the request fails with reason "{reason}""#)]
fn fails_with_reason(world: &DispatchWorld, reason: String) -> Result<(), eyre::Report> {
    let response = &outcome(world)?.response;
    if response.status != DispatchStatus::Failed {
        return Err(eyre::eyre!("expected failure, got {:?}", response.status));
    }
    if !response.reasons.contains(&reason) {
        return Err(eyre::eyre!(
            "expected reason {reason:?}, got {:?}",
            response.reasons
        ));
    }
    Ok(())
}

#[then("the attempt count is {count:u32}")]
fn attempt_count(world: &DispatchWorld, count: u32) -> Result<(), eyre::Report> {
    let attempts = outcome(world)?.response.attempts;
    if attempts != count {
        return Err(eyre::eyre!("expected {count} attempts, got {attempts}"));
    }
    Ok(())
}

#[then(r#"the audit trail ends in "{state}""#)]
fn trail_ends_in(world: &DispatchWorld, state: String) -> Result<(), eyre::Report> {
    let expected = PipelineState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid expected state: {err}"))?;
    let entries = trail(world)?;
    let last = entries
        .last()
        .ok_or_else(|| eyre::eyre!("audit trail is empty"))?;
    let reached = last.details().transition.target();
    if reached != expected {
        return Err(eyre::eyre!("expected trail to end in {expected}, got {reached}"));
    }
    Ok(())
}

#[then("the response is flagged audit-degraded")]
fn flagged_audit_degraded(world: &DispatchWorld) -> Result<(), eyre::Report> {
    if !outcome(world)?.response.audit_degraded {
        return Err(eyre::eyre!("response was not flagged audit-degraded"));
    }
    Ok(())
}

#[then("the audit trail is complete once the store recovers")]
fn trail_complete_after_recovery(world: &DispatchWorld) -> Result<(), eyre::Report> {
    world.audit.set_available(true);
    let flushed = run_async(world.dispatcher.recorder().reconcile())
        .wrap_err("reconcile queued audit entries")?;
    let entries = trail(world)?;
    if flushed != entries.len() || entries.is_empty() {
        return Err(eyre::eyre!(
            "flushed {flushed} entries but trail holds {}",
            entries.len()
        ));
    }
    if !entries.last().is_some_and(AuditEntry::is_terminal) {
        return Err(eyre::eyre!("reconciled trail has no terminal entry"));
    }
    Ok(())
}
