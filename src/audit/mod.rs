//! Append-only audit trail of pipeline transitions.
//!
//! Every dispatcher transition produces one [`domain::AuditEntry`] keyed by
//! `(request_id, attempt, action)`. Stores reject duplicate keys, so a
//! replayed write after a crash or timeout never creates a second entry.
//! The [`services::AuditRecorder`] bounds each write with a timeout and
//! queues failed writes for background reconciliation.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
