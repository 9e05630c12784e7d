//! Caller verification and the admin query surface.
//!
//! Bearer tokens are exchanged for a [`crate::request::CallerIdentity`]
//! through the [`ports::IdentityVerifier`] port. The
//! [`services::AuditQueryService`] exposes audit trails and pattern
//! insights to administrators only.

pub mod adapters;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
