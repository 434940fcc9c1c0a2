//! Session validation port.
//!
//! Turns a bearer access token into an [`Actor`]. The queue core never sees
//! tokens; HTTP middleware calls this and puts the actor on the request.

use async_trait::async_trait;

use crate::domain::foundation::{Actor, AuthError};

/// Validates access tokens and resolves the acting principal.
///
/// # Contract
///
/// Implementations must:
/// - Validate the token signature and expiry
/// - Reject refresh tokens with `AuthError::RefreshTokenNotAllowed`
/// - Return `AuthError::UserNotFound` if the user no longer exists
/// - Return `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw token (without the "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<Actor, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_validator_is_object_safe() {
        fn _accepts_dyn(_validator: &dyn SessionValidator) {}
    }
}
