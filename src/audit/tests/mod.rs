//! Unit tests for the audit module.


use crate::audit::domain::{AuditEntry, TransitionDetails, TransitionRecord};
use crate::dispatch::domain::PipelineState;
use crate::request::{RequestId, UserId};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub(super) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn record(
    request_id: RequestId,
    user: &str,
    attempt: u32,
    sequence: u64,
    from: PipelineState,
    to: PipelineState,
) -> TransitionRecord {
    TransitionRecord {
        request_id,
        user_id: UserId::new(user).expect("valid user id"),
        attempt,
        sequence,
        details: TransitionDetails::new(from.transition(to).expect("permitted transition")),
    }
}

pub(super) fn entry_at(record: TransitionRecord, hour: u32) -> AuditEntry {
    AuditEntry::new(record, at(hour), Duration::days(30))
}
