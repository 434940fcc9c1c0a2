//! Queue events pushed to live subscribers.
//!
//! One event is one JSON object on the wire:
//!
//! ```text
//! { "event": "TOKEN_CREATED" | "TOKEN_STATUS_UPDATED",
//!   "token_id": "...", "token_number": "3",
//!   "doctor_id": "...", "patient_id": "...",
//!   "patient_name": "...",            // omitted when unknown
//!   "status": "waiting" }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DoctorId, PatientId, TokenId};

use super::{Token, TokenNumber, TokenStatus};

/// What happened to the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueEventKind {
    TokenCreated,
    TokenStatusUpdated,
}

/// Immutable, denormalized description of a token change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "event")]
    pub kind: QueueEventKind,
    pub token_id: TokenId,
    pub token_number: TokenNumber,
    pub doctor_id: DoctorId,
    pub patient_id: PatientId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    pub status: TokenStatus,
}

impl QueueEvent {
    fn from_token(kind: QueueEventKind, token: &Token, patient_name: Option<String>) -> Self {
        Self {
            kind,
            token_id: *token.id(),
            token_number: token.number(),
            doctor_id: *token.doctor_id(),
            patient_id: *token.patient_id(),
            patient_name,
            status: token.status(),
        }
    }

    pub fn token_created(token: &Token, patient_name: Option<String>) -> Self {
        Self::from_token(QueueEventKind::TokenCreated, token, patient_name)
    }

    pub fn status_updated(token: &Token, patient_name: Option<String>) -> Self {
        Self::from_token(QueueEventKind::TokenStatusUpdated, token, patient_name)
    }

    /// Encodes the event as a single JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
