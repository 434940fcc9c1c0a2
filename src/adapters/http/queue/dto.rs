//! HTTP DTOs for queue endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::domain::clinic::{Doctor, NewPatient, Patient};
use crate::domain::foundation::{DoctorId, PatientId, Timestamp};
use crate::domain::queue::{QueueError, Token, TokenStatus};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to register a patient.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPatientRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub age: i64,
}

impl From<RegisterPatientRequest> for NewPatient {
    fn from(req: RegisterPatientRequest) -> Self {
        NewPatient {
            name: req.name,
            email: req.email,
            phone: req.phone,
            age: req.age,
        }
    }
}

/// Request to issue a token.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTokenRequest {
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
}

/// Request to change a token's status.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTokenStatusRequest {
    pub status: TokenStatus,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Token as returned by every token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub id: String,
    pub token_number: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub status: TokenStatus,
    pub created_at: Timestamp,
}

impl From<&Token> for TokenResponse {
    fn from(token: &Token) -> Self {
        Self {
            id: token.id().to_string(),
            token_number: token.number().to_string(),
            patient_id: token.patient_id().to_string(),
            doctor_id: token.doctor_id().to_string(),
            status: token.status(),
            created_at: *token.created_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientResponse {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: u16,
}

impl From<&Patient> for PatientResponse {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id.to_string(),
            name: patient.name.clone(),
            email: patient.email.clone(),
            phone: patient.phone.clone(),
            age: patient.age,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorResponse {
    pub id: String,
    pub user_id: String,
    pub specialty: String,
    pub consultation_fee: f64,
    pub email: String,
}

impl From<&Doctor> for DoctorResponse {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id.to_string(),
            user_id: doctor.user_id.to_string(),
            specialty: doctor.specialty.clone(),
            consultation_fee: doctor.consultation_fee,
            email: doctor.email.clone(),
        }
    }
}

/// Error envelope: `{"error": {"code", "message", "retryable"}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                retryable,
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message, false)
    }
}

impl From<&QueueError> for ErrorResponse {
    fn from(err: &QueueError) -> Self {
        Self::new(err.code().to_string(), err.to_string(), err.is_retryable())
    }
}
