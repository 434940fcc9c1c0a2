//! HTTP handlers for patient, doctor and token endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::middleware::RequireActor;
use crate::application::queue::{CreateTokenCommand, QueueService, UpdateTokenStatusCommand};
use crate::domain::foundation::TokenId;
use crate::domain::queue::{QueueError, Token};

use super::dto::{
    CreateTokenRequest, DoctorResponse, ErrorResponse, PatientResponse, RegisterPatientRequest,
    TokenResponse, UpdateTokenStatusRequest,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct QueueHandlers {
    service: Arc<QueueService>,
}

impl QueueHandlers {
    pub fn new(service: Arc<QueueService>) -> Self {
        Self { service }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Patients and doctors
// ════════════════════════════════════════════════════════════════════════════

/// GET /patients - List registered patients
pub async fn list_patients(
    State(handlers): State<QueueHandlers>,
    RequireActor(actor): RequireActor,
) -> Response {
    match handlers.service.list_patients(&actor).await {
        Ok(patients) => {
            let body: Vec<PatientResponse> = patients.iter().map(PatientResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => handle_queue_error(e),
    }
}

/// POST /patients - Register a patient
pub async fn register_patient(
    State(handlers): State<QueueHandlers>,
    RequireActor(actor): RequireActor,
    Json(req): Json<RegisterPatientRequest>,
) -> Response {
    match handlers.service.register_patient(&actor, req.into()).await {
        Ok(patient) => (StatusCode::CREATED, Json(PatientResponse::from(&patient))).into_response(),
        Err(e) => handle_queue_error(e),
    }
}

/// GET /patients/doctors - List doctors
pub async fn list_doctors(
    State(handlers): State<QueueHandlers>,
    RequireActor(actor): RequireActor,
) -> Response {
    match handlers.service.list_doctors(&actor).await {
        Ok(doctors) => {
            let body: Vec<DoctorResponse> = doctors.iter().map(DoctorResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => handle_queue_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tokens
// ════════════════════════════════════════════════════════════════════════════

/// POST /patients/token - Issue the next token for a doctor
pub async fn create_token(
    State(handlers): State<QueueHandlers>,
    RequireActor(actor): RequireActor,
    Json(req): Json<CreateTokenRequest>,
) -> Response {
    let cmd = CreateTokenCommand {
        patient_id: req.patient_id,
        doctor_id: req.doctor_id,
    };

    match handlers.service.create_token(cmd, &actor.roles).await {
        Ok(token) => (StatusCode::CREATED, Json(TokenResponse::from(&token))).into_response(),
        Err(e) => handle_queue_error(e),
    }
}

/// GET /patients/tokens - The acting doctor's queue
pub async fn doctor_tokens(
    State(handlers): State<QueueHandlers>,
    RequireActor(actor): RequireActor,
) -> Response {
    token_list(handlers.service.doctor_tokens(&actor).await)
}

/// PATCH /patients/tokens/:id - Move a token to a new status
pub async fn update_token_status(
    State(handlers): State<QueueHandlers>,
    RequireActor(actor): RequireActor,
    Path(token_id): Path<String>,
    Json(req): Json<UpdateTokenStatusRequest>,
) -> Response {
    let token_id = match token_id.parse::<TokenId>() {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request("Invalid token ID")),
            )
                .into_response()
        }
    };

    let cmd = UpdateTokenStatusCommand {
        token_id,
        status: req.status,
    };

    match handlers.service.update_status_as(&actor, cmd).await {
        Ok(token) => (StatusCode::OK, Json(TokenResponse::from(&token))).into_response(),
        Err(e) => handle_queue_error(e),
    }
}

/// GET /patients/tokens/today - Every token issued today
pub async fn today_tokens(
    State(handlers): State<QueueHandlers>,
    RequireActor(actor): RequireActor,
) -> Response {
    token_list(handlers.service.today_tokens(&actor).await)
}

/// GET /patients/tokens/public/today - Open tokens for the waiting-room board
pub async fn public_board(State(handlers): State<QueueHandlers>) -> Response {
    token_list(handlers.service.public_board().await)
}

fn token_list(result: Result<Vec<Token>, QueueError>) -> Response {
    match result {
        Ok(tokens) => {
            let body: Vec<TokenResponse> = tokens.iter().map(TokenResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => handle_queue_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn handle_queue_error(error: QueueError) -> Response {
    let status = match &error {
        QueueError::NotFound { .. } => StatusCode::NOT_FOUND,
        QueueError::Forbidden(_) => StatusCode::FORBIDDEN,
        QueueError::InvalidTransition { .. } | QueueError::Conflict(_) => StatusCode::CONFLICT,
        QueueError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        QueueError::SequencingUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        QueueError::Infrastructure(_) => {
            tracing::error!(error = %error, "Queue request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let body = match &error {
        // Storage details stay in the log.
        QueueError::Infrastructure(_) => {
            ErrorResponse::new(error.code().to_string(), "Internal server error", false)
        }
        _ => ErrorResponse::from(&error),
    };

    (status, Json(body)).into_response()
}
