//! Port contracts for pattern persistence.

pub mod store;

pub use store::{PatternStore, PatternStoreError, PatternStoreResult};
