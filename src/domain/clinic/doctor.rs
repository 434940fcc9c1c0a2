//! Doctor record.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DoctorId, UserId};

/// A doctor who runs a queue.
///
/// Linked one-to-one with a login user; the link is how an authenticated
/// doctor is resolved to the queue they own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub user_id: UserId,
    /// Login email of the linked user.
    pub email: String,
    pub specialty: String,
    pub consultation_fee: f64,
}

impl Doctor {
    pub fn new(
        user_id: UserId,
        email: impl Into<String>,
        specialty: impl Into<String>,
        consultation_fee: f64,
    ) -> Self {
        Self {
            id: DoctorId::new(),
            user_id,
            email: email.into(),
            specialty: specialty.into(),
            consultation_fee,
        }
    }
}
