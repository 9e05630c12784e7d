//! Inbound work requests and the caller identity attached to them.
//!
//! A [`Request`] is created once per inbound call from verified caller
//! identity, free-text instructions, and opaque file keys. Its kind stays
//! unset until the intent classifier runs, after which it is fixed.

mod error;
mod identity;
mod ids;
mod kind;
mod request;

pub use error::RequestError;
pub use identity::{CallerIdentity, Role, UserId};
pub use ids::{InvocationId, RequestId};
pub use kind::{AgentKind, RequestKind};
pub use request::{FileKey, Request, RequestMode};

#[cfg(test)]
mod tests;
