//! Audit orchestration services.

mod recorder;

pub use recorder::{AuditRecorder, RecordOutcome};
