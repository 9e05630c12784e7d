//! `PostgreSQL` adapter for the audit trail.

mod models;
mod schema;
mod store;

pub use store::{AuditPgPool, PostgresAuditStore};
