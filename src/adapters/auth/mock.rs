//! Mock session validator for tests and local development.
//!
//! ```ignore
//! let validator = MockSessionValidator::new()
//!     .with_actor("staff-token", Actor::new(UserId::new(), RoleSet::of(&[Role::Staff])));
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{Actor, AuthError};
use crate::ports::SessionValidator;

/// Maps fixed token strings to actors. Unknown tokens are `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, Actor>>,
    force_error: RwLock<Option<AuthError>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as `actor`.
    pub fn with_actor(self, token: impl Into<String>, actor: Actor) -> Self {
        self.add_token(token, actor);
        self
    }

    /// Forces every validation to return `error`.
    pub fn with_error(self, error: AuthError) -> Self {
        if let Ok(mut forced) = self.force_error.write() {
            *forced = Some(error);
        }
        self
    }

    /// Registers a token at runtime.
    pub fn add_token(&self, token: impl Into<String>, actor: Actor) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.into(), actor);
        }
    }

    pub fn remove_token(&self, token: &str) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.remove(token);
        }
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<Actor, AuthError> {
        let forced = self
            .force_error
            .read()
            .map_err(|_| AuthError::service_unavailable("mock validator poisoned"))?
            .clone();
        if let Some(error) = forced {
            return Err(error);
        }

        self.tokens
            .read()
            .map_err(|_| AuthError::service_unavailable("mock validator poisoned"))?
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Role, RoleSet, UserId};

    fn staff() -> Actor {
        Actor::new(UserId::new(), RoleSet::of(&[Role::Staff]))
    }

    #[tokio::test]
    async fn known_token_returns_actor() {
        let actor = staff();
        let validator = MockSessionValidator::new().with_actor("t", actor.clone());
        assert_eq!(validator.validate("t").await.unwrap(), actor);
    }

    #[tokio::test]
    async fn unknown_or_removed_token_is_invalid() {
        let validator = MockSessionValidator::new().with_actor("t", staff());
        validator.remove_token("t");
        assert!(matches!(
            validator.validate("t").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn forced_error_wins() {
        let validator = MockSessionValidator::new()
            .with_actor("t", staff())
            .with_error(AuthError::TokenExpired);
        assert!(matches!(
            validator.validate("t").await,
            Err(AuthError::TokenExpired)
        ));
    }
}
