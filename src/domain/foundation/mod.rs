//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, roles, and error types
//! that form the vocabulary of the clinic queue domain.

mod auth;
mod authorization;
mod errors;
mod ids;
mod ownership;
mod state_machine;
mod timestamp;

pub use auth::{Actor, AuthError};
pub use authorization::{AccessGate, Role, RoleSet};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{DoctorId, PatientId, TokenId, UserId};
pub use ownership::OwnedByDoctor;
pub use state_machine::{StateMachine, TransitionRejected};
pub use timestamp::Timestamp;
