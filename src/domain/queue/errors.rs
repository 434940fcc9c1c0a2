//! Queue-specific error types.

use thiserror::Error;

use crate::domain::foundation::{
    DomainError, ErrorCode, TransitionRejected, ValidationError,
};

use super::TokenStatus;

/// Kind of entity a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Token,
    Doctor,
    Patient,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Resource::Token => "Token",
            Resource::Doctor => "Doctor",
            Resource::Patient => "Patient",
        };
        f.write_str(s)
    }
}

/// Errors surfaced by queue operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Referenced doctor, patient or token does not exist.
    #[error("{resource} not found: {id}")]
    NotFound { resource: Resource, id: String },

    /// Role or ownership check failed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The state machine rejected the requested status change.
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: TokenStatus, to: TokenStatus },

    /// The sequence for a doctor/day could not be locked in time.
    #[error("Token sequencing temporarily unavailable, retry")]
    SequencingUnavailable,

    /// A unique constraint would be violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input failed validation.
    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    /// Storage or other infrastructure failure.
    #[error("Error: {0}")]
    Infrastructure(String),
}

impl QueueError {
    pub fn not_found(resource: Resource, id: impl ToString) -> Self {
        QueueError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        QueueError::Forbidden(reason.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        QueueError::Conflict(reason.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        QueueError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        QueueError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            QueueError::NotFound { resource, .. } => match resource {
                Resource::Token => ErrorCode::TokenNotFound,
                Resource::Doctor => ErrorCode::DoctorNotFound,
                Resource::Patient => ErrorCode::PatientNotFound,
            },
            QueueError::Forbidden(_) => ErrorCode::Forbidden,
            QueueError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            QueueError::SequencingUnavailable => ErrorCode::SequencingUnavailable,
            QueueError::Conflict(_) => ErrorCode::Conflict,
            QueueError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            QueueError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns true if the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueueError::SequencingUnavailable)
    }
}

impl From<TransitionRejected<TokenStatus>> for QueueError {
    fn from(err: TransitionRejected<TokenStatus>) -> Self {
        QueueError::InvalidTransition {
            from: err.from,
            to: err.to,
        }
    }
}

impl From<ValidationError> for QueueError {
    fn from(err: ValidationError) -> Self {
        QueueError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for QueueError {
    fn from(err: DomainError) -> Self {
        let id = err.details.get("id").cloned().unwrap_or_default();
        match err.code {
            ErrorCode::TokenNotFound => QueueError::not_found(Resource::Token, id),
            ErrorCode::DoctorNotFound => QueueError::not_found(Resource::Doctor, id),
            ErrorCode::PatientNotFound => QueueError::not_found(Resource::Patient, id),
            ErrorCode::Forbidden | ErrorCode::Unauthorized => QueueError::Forbidden(err.message),
            ErrorCode::Conflict => QueueError::Conflict(err.message),
            ErrorCode::SequencingUnavailable => QueueError::SequencingUnavailable,
            ErrorCode::ValidationFailed => QueueError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => QueueError::Infrastructure(err.to_string()),
        }
    }
}
