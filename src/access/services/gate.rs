//! Token verification and role checks.

use thiserror::Error;
use tracing::{debug, warn};

use crate::access::ports::{AuthError, IdentityVerifier};
use crate::audit::ports::AuditStoreError;
use crate::pattern::ports::PatternStoreError;
use crate::request::{CallerIdentity, Role};

/// Result type for access-controlled operations.
pub type AccessResult<T> = Result<T, AccessError>;

/// Errors raised by access-controlled operations.
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    /// The caller could not be verified.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The caller's role is below the one required.
    #[error("role {held} does not permit this action; {required} required")]
    Forbidden {
        /// Role the caller holds.
        held: Role,
        /// Role the action requires.
        required: Role,
    },

    /// The audit store failed.
    #[error(transparent)]
    Audit(#[from] AuditStoreError),

    /// The pattern store failed.
    #[error(transparent)]
    Patterns(#[from] PatternStoreError),
}

/// Checks that `caller` holds at least `required`.
///
/// # Errors
///
/// Returns [`AccessError::Forbidden`] when the role is insufficient.
pub fn require_role(caller: &CallerIdentity, required: Role) -> AccessResult<()> {
    let held = caller.role();
    if held.permits(required) {
        Ok(())
    } else {
        warn!(user_id = %caller.user_id(), %held, %required, "access denied");
        Err(AccessError::Forbidden { held, required })
    }
}

/// Verifies `token` and checks the resulting identity against `required`.
///
/// # Errors
///
/// Returns [`AccessError::Auth`] when verification fails and
/// [`AccessError::Forbidden`] when the role is insufficient.
pub async fn authenticate<V>(
    verifier: &V,
    token: &str,
    required: Role,
) -> AccessResult<CallerIdentity>
where
    V: IdentityVerifier + ?Sized,
{
    let caller = verifier.verify(token).await?;
    require_role(&caller, required)?;
    debug!(user_id = %caller.user_id(), role = %caller.role(), "caller verified");
    Ok(caller)
}
