//! Authentication middleware and extractor for axum.
//!
//! ```text
//! Request → auth_middleware → injects Actor into extensions
//!                                      ↓
//!                              Handler → RequireActor reads from extensions
//! ```
//!
//! The middleware uses the `SessionValidator` port, so the JWT adapter and
//! the mock used in tests are interchangeable.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::{Actor, AuthError};
use crate::ports::SessionValidator;

/// Auth middleware state - wraps the session validator.
pub type AuthState = Arc<dyn SessionValidator>;

fn error_body(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": {
                "code": code,
                "message": message,
                "retryable": status == StatusCode::SERVICE_UNAVAILABLE,
            }
        })),
    )
        .into_response()
}

/// Validates `Authorization: Bearer <token>` and injects the [`Actor`].
///
/// Requests without a token pass through untouched; routes that need an
/// actor use [`RequireActor`]. A token that is present but invalid is
/// rejected here with 401.
pub async fn auth_middleware(
    State(validator): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned);

    let Some(token) = token else {
        return next.run(request).await;
    };

    match validator.validate(&token).await {
        Ok(actor) => {
            request.extensions_mut().insert(actor);
            next.run(request).await
        }
        Err(e) => {
            let (status, message) = match &e {
                AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
                AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
                AuthError::RefreshTokenNotAllowed => {
                    (StatusCode::UNAUTHORIZED, "Refresh token not allowed")
                }
                AuthError::UserNotFound => (StatusCode::UNAUTHORIZED, "User not found"),
                AuthError::ServiceUnavailable(msg) => {
                    tracing::error!(error = %msg, "Auth service unavailable");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "Authentication service unavailable",
                    )
                }
            };
            error_body(status, "AUTH_ERROR", message)
        }
    }
}

/// Extractor that requires an authenticated actor.
#[derive(Debug, Clone)]
pub struct RequireActor(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for RequireActor
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .map(RequireActor)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone)]
pub enum AuthRejection {
    /// No valid access token was provided.
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated => error_body(
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Authentication required",
            ),
        }
    }
}
