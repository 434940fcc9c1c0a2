//! HS256 JWT adapter for session validation.
//!
//! Validates access tokens signed with the shared secret, then resolves the
//! user's roles and linked doctor record through the `ClinicDirectory` port:
//!
//! 1. Verify signature and expiry
//! 2. Reject refresh tokens (`"type": "refresh"`)
//! 3. Look up roles (unknown user → `UserNotFound`)
//! 4. Attach the doctor record, if any

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Actor, AuthError, UserId};
use crate::ports::{ClinicDirectory, SessionValidator};

const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Claims carried by access tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Expiry (Unix epoch seconds)
    pub exp: i64,
}

/// Session validator for HS256-signed access tokens.
pub struct JwtSessionValidator {
    key: DecodingKey,
    validation: Validation,
    directory: Arc<dyn ClinicDirectory>,
}

impl JwtSessionValidator {
    pub fn new(secret: &SecretString, directory: Arc<dyn ClinicDirectory>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
            directory,
        }
    }

    fn decode_claims(&self, token: &str) -> Result<AccessClaims, AuthError> {
        decode::<AccessClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::debug!(error = %e, "Token validation failed");
                    AuthError::InvalidToken
                }
            })
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<Actor, AuthError> {
        let claims = self.decode_claims(token)?;

        if claims.token_type.as_deref() == Some(REFRESH_TOKEN_TYPE) {
            return Err(AuthError::RefreshTokenNotAllowed);
        }

        let user_id: UserId = claims.user_id.parse().map_err(|_| {
            tracing::warn!(user_id = %claims.user_id, "Invalid user id in token");
            AuthError::InvalidToken
        })?;

        let roles = self
            .directory
            .roles_for_user(&user_id)
            .await
            .map_err(|e| AuthError::service_unavailable(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        let doctor = self
            .directory
            .doctor_for_user(&user_id)
            .await
            .map_err(|e| AuthError::service_unavailable(e.to_string()))?;

        let actor = Actor::new(user_id, roles);
        Ok(match doctor {
            Some(doctor) => actor.with_doctor(doctor.id),
            None => actor,
        })
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}
