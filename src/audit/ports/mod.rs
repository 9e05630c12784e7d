//! Port contracts for audit persistence.

pub mod store;

pub use store::{AppendOutcome, AuditStore, AuditStoreError, AuditStoreResult};
