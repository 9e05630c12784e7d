//! `PostgreSQL` adapter for analyzer patterns.

mod models;
mod schema;
mod store;

pub use store::{PatternPgPool, PostgresPatternStore};
