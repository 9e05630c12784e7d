//! Audit entries, their deduplication key, and query filters.

mod entry;
mod query;

pub use entry::{
    AuditEntry, AuditEventType, AuditLogId, DedupKey, PersistedAuditEntry, TransitionDetails,
    TransitionRecord,
};
pub use query::AuditQuery;
