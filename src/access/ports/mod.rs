//! Port contracts for caller verification.

pub mod identity;

pub use identity::{AuthError, AuthResult, IdentityVerifier};
