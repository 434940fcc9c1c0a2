//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Shortest HS256 key accepted in production.
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Authentication configuration (HS256 access tokens)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared signing key for access tokens
    pub jwt_secret: SecretString,
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: SecretString::new(secret.into()),
        }
    }

    /// Validate authentication configuration
    ///
    /// Any non-empty secret is accepted outside production.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if *environment == Environment::Production && secret.len() < MIN_PRODUCTION_SECRET_LEN {
            return Err(ValidationError::WeakJwtSecret(MIN_PRODUCTION_SECRET_LEN));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_secret_rejected() {
        let config = AuthConfig::new("");
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"))
        );
    }

    #[test]
    fn test_short_secret_only_allowed_outside_production() {
        let config = AuthConfig::new("dev-secret");
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::WeakJwtSecret(MIN_PRODUCTION_SECRET_LEN))
        );
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let config = AuthConfig::new("super-secret-signing-key");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
