//! Identity verifier port.

use crate::request::CallerIdentity;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for identity verification.
pub type AuthResult<T> = Result<T, AuthError>;

/// Exchanges opaque bearer tokens for verified caller identities.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies `token` and returns the identity it was issued to.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] when the token is unknown or
    /// revoked, and [`AuthError::Unavailable`] when the identity provider
    /// cannot be reached.
    async fn verify(&self, token: &str) -> AuthResult<CallerIdentity>;
}

/// Errors returned by identity verifiers.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is blank, unknown, or revoked.
    #[error("invalid or revoked token")]
    InvalidToken,

    /// The identity provider cannot be reached.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    /// Provider-side failure.
    #[error("identity provider error: {0}")]
    Provider(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuthError {
    /// Wraps a provider error.
    pub fn provider(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Provider(Arc::new(err))
    }
}
