//! HTTP adapter for the token queue.
//!
//! Endpoints (mounted at `/patients`):
//! - `GET  /`                     - list patients (staff, admin)
//! - `POST /`                     - register a patient (staff, admin)
//! - `POST /token`                - issue a token (staff, admin)
//! - `GET  /tokens`               - acting doctor's queue (doctor)
//! - `PATCH /tokens/:id`          - change a token's status (owning doctor)
//! - `GET  /tokens/today`         - today's tokens (staff, admin)
//! - `GET  /tokens/public/today`  - open tokens for the waiting room (public)
//! - `GET  /doctors`              - list doctors (staff, admin)

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CreateTokenRequest, DoctorResponse, ErrorBody, ErrorResponse, PatientResponse,
    RegisterPatientRequest, TokenResponse, UpdateTokenStatusRequest,
};
pub use handlers::QueueHandlers;
pub use routes::queue_routes;
