//! In-memory implementation of TokenRepository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DoctorId, DomainError, ErrorCode, TokenId};
use crate::domain::queue::{IssueDay, SequenceKey, Token, TokenNumber, TokenStatus};
use crate::ports::TokenRepository;

/// Token store backed by a `HashMap`.
///
/// Enforces the same `(doctor, day, number)` uniqueness the database
/// constraint does.
#[derive(Debug, Default)]
pub struct InMemoryTokenRepository {
    tokens: RwLock<HashMap<TokenId, Token>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens.
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

fn oldest_first(mut tokens: Vec<Token>) -> Vec<Token> {
    tokens.sort_by(|a, b| {
        a.created_at()
            .cmp(b.created_at())
            .then(a.number().cmp(&b.number()))
    });
    tokens
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn save(&self, token: &Token) -> Result<(), DomainError> {
        let mut tokens = self.tokens.write().await;

        if tokens.contains_key(token.id()) {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("Token already exists: {}", token.id()),
            ));
        }

        let key = token.sequence_key();
        let taken = tokens
            .values()
            .any(|t| t.sequence_key() == key && t.number() == token.number());
        if taken {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("Token number {} already issued for {}", token.number(), key),
            ));
        }

        tokens.insert(*token.id(), token.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        token: &Token,
        previous: TokenStatus,
    ) -> Result<(), DomainError> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(token.id()) {
            Some(stored) if stored.status() != previous => Err(DomainError::new(
                ErrorCode::Conflict,
                format!(
                    "Token {} is {}, expected {}",
                    token.id(),
                    stored.status(),
                    previous
                ),
            )),
            Some(stored) => {
                *stored = token.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::TokenNotFound,
                format!("Token not found: {}", token.id()),
            )
            .with_detail("id", token.id().to_string())),
        }
    }

    async fn find_by_id(&self, id: &TokenId) -> Result<Option<Token>, DomainError> {
        Ok(self.tokens.read().await.get(id).cloned())
    }

    async fn max_number(&self, key: &SequenceKey) -> Result<Option<TokenNumber>, DomainError> {
        Ok(self
            .tokens
            .read()
            .await
            .values()
            .filter(|t| t.sequence_key() == *key)
            .map(|t| t.number())
            .max())
    }

    async fn list_by_doctor(&self, doctor_id: &DoctorId) -> Result<Vec<Token>, DomainError> {
        let tokens = self
            .tokens
            .read()
            .await
            .values()
            .filter(|t| t.doctor_id() == doctor_id)
            .cloned()
            .collect();
        Ok(oldest_first(tokens))
    }

    async fn list_issued_on(&self, day: IssueDay) -> Result<Vec<Token>, DomainError> {
        let tokens = self
            .tokens
            .read()
            .await
            .values()
            .filter(|t| t.issue_day() == day)
            .cloned()
            .collect();
        Ok(oldest_first(tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{OwnedByDoctor, PatientId, Timestamp};
    use crate::domain::queue::TokenStateMachine;

    fn token(doctor: DoctorId, number: u32, created_at: Timestamp) -> Token {
        Token::issue(
            TokenNumber::new(number).unwrap(),
            doctor,
            PatientId::new(),
            created_at,
        )
    }

    #[tokio::test]
    async fn save_and_find() {
        let repo = InMemoryTokenRepository::new();
        let token = token(DoctorId::new(), 1, Timestamp::now());

        repo.save(&token).await.unwrap();

        assert_eq!(repo.find_by_id(token.id()).await.unwrap(), Some(token));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn duplicate_number_for_same_key_is_conflict() {
        let repo = InMemoryTokenRepository::new();
        let doctor = DoctorId::new();
        let now = Timestamp::now();

        repo.save(&token(doctor, 1, now)).await.unwrap();
        let err = repo.save(&token(doctor, 1, now)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        // same number on another day is fine
        repo.save(&token(doctor, 1, now.add_days(-1))).await.unwrap();
    }

    #[tokio::test]
    async fn max_number_is_scoped_to_key() {
        let repo = InMemoryTokenRepository::new();
        let doctor = DoctorId::new();
        let now = Timestamp::now();
        repo.save(&token(doctor, 1, now)).await.unwrap();
        repo.save(&token(doctor, 2, now)).await.unwrap();
        repo.save(&token(DoctorId::new(), 9, now)).await.unwrap();

        let key = SequenceKey::new(doctor, IssueDay::of(&now));
        assert_eq!(repo.max_number(&key).await.unwrap().map(|n| n.value()), Some(2));

        let empty = SequenceKey::new(DoctorId::new(), IssueDay::of(&now));
        assert_eq!(repo.max_number(&empty).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_status_of_unknown_token_is_not_found() {
        let repo = InMemoryTokenRepository::new();
        let err = repo
            .update_status(&token(DoctorId::new(), 1, Timestamp::now()), TokenStatus::Waiting)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenNotFound);
    }

    #[tokio::test]
    async fn update_status_persists_new_status() {
        let repo = InMemoryTokenRepository::new();
        let token = token(DoctorId::new(), 1, Timestamp::now());
        repo.save(&token).await.unwrap();

        let started =
            TokenStateMachine::apply(&token, TokenStatus::InProgress, token.owning_doctor())
                .unwrap();
        repo.update_status(&started, TokenStatus::Waiting).await.unwrap();

        let stored = repo.find_by_id(token.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), TokenStatus::InProgress);
    }

    #[tokio::test]
    async fn stale_status_update_is_conflict() {
        let repo = InMemoryTokenRepository::new();
        let token = token(DoctorId::new(), 1, Timestamp::now());
        repo.save(&token).await.unwrap();
        let doctor = *token.owning_doctor();

        let done = TokenStateMachine::apply(&token, TokenStatus::Completed, &doctor).unwrap();
        repo.update_status(&done, TokenStatus::Waiting).await.unwrap();

        // a second writer that still believes the token is waiting
        let started = TokenStateMachine::apply(&token, TokenStatus::InProgress, &doctor).unwrap();
        let err = repo
            .update_status(&started, TokenStatus::Waiting)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        let stored = repo.find_by_id(token.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), TokenStatus::Completed);
    }

    #[tokio::test]
    async fn listings_are_oldest_first() {
        let repo = InMemoryTokenRepository::new();
        let doctor = DoctorId::new();
        let now = Timestamp::now();
        let yesterday = token(doctor, 1, now.add_days(-1));
        let first = token(doctor, 1, now);
        let second = token(doctor, 2, now);

        repo.save(&second).await.unwrap();
        repo.save(&yesterday).await.unwrap();
        repo.save(&first).await.unwrap();

        let all = repo.list_by_doctor(&doctor).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id(), yesterday.id());

        let today = repo.list_issued_on(IssueDay::of(&now)).await.unwrap();
        let numbers: Vec<u32> = today.iter().map(|t| t.number().value()).collect();
        assert_eq!(numbers, vec![1, 2]);
    }
}
