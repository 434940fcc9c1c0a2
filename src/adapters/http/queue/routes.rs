//! HTTP routes for patient, doctor and token endpoints.

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers::{
    create_token, doctor_tokens, list_doctors, list_patients, public_board, register_patient,
    today_tokens, update_token_status, QueueHandlers,
};

/// Creates the queue router, mounted at `/patients`.
pub fn queue_routes(handlers: QueueHandlers) -> Router {
    Router::new()
        .route("/", get(list_patients).post(register_patient))
        .route("/token", post(create_token))
        .route("/tokens", get(doctor_tokens))
        .route("/tokens/today", get(today_tokens))
        .route("/tokens/public/today", get(public_board))
        .route("/tokens/:id", patch(update_token_status))
        .route("/doctors", get(list_doctors))
        .with_state(handlers)
}
