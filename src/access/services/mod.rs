//! Access control services.

mod gate;
mod query;

pub use gate::{AccessError, AccessResult, authenticate, require_role};
pub use query::AuditQueryService;
