//! Token repository port.
//!
//! Persistence contract for issued tokens. The repository stores tokens;
//! it never assigns numbers (that is the sequencer's job) and never decides
//! whether a status change is legal.

use async_trait::async_trait;

use crate::domain::foundation::{DoctorId, DomainError, TokenId};
use crate::domain::queue::{IssueDay, SequenceKey, Token, TokenNumber, TokenStatus};

/// Repository port for Token persistence.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Save a newly issued token.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the number is already taken for the token's sequence key
    /// - `DatabaseError` on persistence failure
    async fn save(&self, token: &Token) -> Result<(), DomainError>;

    /// Persist the status of an existing token, provided the stored status
    /// is still `previous`.
    ///
    /// # Errors
    ///
    /// - `TokenNotFound` if the token doesn't exist
    /// - `Conflict` if the stored status is no longer `previous`
    /// - `DatabaseError` on persistence failure
    async fn update_status(
        &self,
        token: &Token,
        previous: TokenStatus,
    ) -> Result<(), DomainError>;

    /// Find a token by its ID.
    async fn find_by_id(&self, id: &TokenId) -> Result<Option<Token>, DomainError>;

    /// Highest number persisted for a sequence key, if any.
    async fn max_number(&self, key: &SequenceKey) -> Result<Option<TokenNumber>, DomainError>;

    /// All tokens of a doctor, oldest first.
    async fn list_by_doctor(&self, doctor_id: &DoctorId) -> Result<Vec<Token>, DomainError>;

    /// All tokens issued on a day, oldest first.
    async fn list_issued_on(&self, day: IssueDay) -> Result<Vec<Token>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn TokenRepository) {}
    }
}
