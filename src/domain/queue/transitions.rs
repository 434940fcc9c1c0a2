//! Validated status changes on a token.

use crate::domain::foundation::{DoctorId, OwnedByDoctor, StateMachine};

use super::{QueueError, Token, TokenStatus};

/// Applies status changes to tokens.
///
/// Pure and synchronous: persisting the returned token is the caller's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenStateMachine;

impl TokenStateMachine {
    /// Moves `token` to `requested` on behalf of `acting_doctor`.
    ///
    /// Ownership is checked first, so a doctor who does not own the token
    /// always gets `Forbidden`, whatever the requested status. Only `status`
    /// differs between the input and the returned token.
    pub fn apply(
        token: &Token,
        requested: TokenStatus,
        acting_doctor: &DoctorId,
    ) -> Result<Token, QueueError> {
        if !token.is_owned_by(acting_doctor) {
            return Err(QueueError::forbidden(format!(
                "token {} belongs to another doctor",
                token.id()
            )));
        }

        let next = token.status().transition_to(requested)?;

        let mut updated = token.clone();
        updated.set_status(next);
        Ok(updated)
    }
}
