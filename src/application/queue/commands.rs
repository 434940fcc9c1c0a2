//! Commands accepted by the queue service.

use crate::domain::foundation::{DoctorId, PatientId, TokenId};
use crate::domain::queue::TokenStatus;

/// Issue the next token in a doctor's queue for today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateTokenCommand {
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
}

/// Move a token to a new status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateTokenStatusCommand {
    pub token_id: TokenId,
    pub status: TokenStatus,
}
