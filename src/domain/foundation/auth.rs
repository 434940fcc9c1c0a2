//! Authentication types for the domain layer.
//!
//! An [`Actor`] is the principal behind a request after its access token has
//! been validated. Any session validator adapter can populate it; the domain
//! only ever looks at the user id, the role set and the linked doctor record.

use super::{DoctorId, Role, RoleSet, UserId};
use thiserror::Error;

/// Authenticated principal acting on the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Login user behind the request.
    pub user_id: UserId,

    /// Roles granted to the user.
    pub roles: RoleSet,

    /// Doctor record linked to the user, if the user is a doctor.
    pub doctor_id: Option<DoctorId>,
}

impl Actor {
    pub fn new(user_id: UserId, roles: RoleSet) -> Self {
        Self {
            user_id,
            roles,
            doctor_id: None,
        }
    }

    /// Attaches the doctor record linked to this user.
    pub fn with_doctor(mut self, doctor_id: DoctorId) -> Self {
        self.doctor_id = Some(doctor_id);
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// A refresh token was presented where an access token is required.
    #[error("Refresh token not allowed")]
    RefreshTokenNotAllowed,

    /// Token is valid but the user no longer exists.
    #[error("User not found")]
    UserNotFound,

    /// The backing directory could not be reached.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}
