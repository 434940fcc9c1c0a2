//! In-memory TokenSequencer with one mutex per sequence key.
//!
//! Each `(doctor, day)` key owns a `tokio::sync::Mutex` guarding its last
//! persisted number. A reservation holds the key's owned guard, so the
//! read-increment-persist cycle of one caller cannot interleave with another
//! caller on the same key. Keys never share a lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::queue::{IssueDay, SequenceKey, Token, TokenNumber};
use crate::ports::{ensure_matches, SequenceReservation, TokenRepository, TokenSequencer};

/// Default bound on waiting for a key's lock.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Counter state of one key.
#[derive(Debug, Default)]
struct KeyCounter {
    /// `None` until the key has been seeded from storage.
    last: Option<Option<TokenNumber>>,
}

#[derive(Default)]
struct CounterTable {
    counters: HashMap<SequenceKey, Arc<Mutex<KeyCounter>>>,
    newest_day: Option<IssueDay>,
}

impl CounterTable {
    fn slot(&mut self, key: &SequenceKey) -> Arc<Mutex<KeyCounter>> {
        if self.newest_day.map_or(true, |day| key.day > day) {
            self.newest_day = Some(key.day);
            self.evict_before(key.day);
        }
        self.counters.entry(*key).or_default().clone()
    }

    /// Drop counters for earlier days that nobody is holding or waiting on.
    fn evict_before(&mut self, day: IssueDay) {
        self.counters
            .retain(|key, slot| key.day >= day || Arc::strong_count(slot) > 1);
    }
}

/// Per-key mutex sequencer.
///
/// A fresh key is seeded from the highest number already persisted for it,
/// so a restarted process continues the day's sequence instead of
/// restarting at 1.
pub struct InMemoryTokenSequencer {
    tokens: Arc<dyn TokenRepository>,
    table: Mutex<CounterTable>,
    acquire_timeout: Duration,
}

impl InMemoryTokenSequencer {
    pub fn new(tokens: Arc<dyn TokenRepository>) -> Self {
        Self::with_timeout(tokens, DEFAULT_ACQUIRE_TIMEOUT)
    }

    pub fn with_timeout(tokens: Arc<dyn TokenRepository>, acquire_timeout: Duration) -> Self {
        Self {
            tokens,
            table: Mutex::new(CounterTable::default()),
            acquire_timeout,
        }
    }

    /// Number of keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.table.lock().await.counters.len()
    }
}

#[async_trait]
impl TokenSequencer for InMemoryTokenSequencer {
    async fn next_number(
        &self,
        key: &SequenceKey,
    ) -> Result<Box<dyn SequenceReservation>, DomainError> {
        let slot = self.table.lock().await.slot(key);

        let mut guard = tokio::time::timeout(self.acquire_timeout, slot.lock_owned())
            .await
            .map_err(|_| {
                tracing::warn!(
                    sequence_key = %key,
                    timeout_ms = self.acquire_timeout.as_millis() as u64,
                    "Timed out waiting for sequence lock"
                );
                DomainError::new(
                    ErrorCode::SequencingUnavailable,
                    format!("Sequence for {} is busy", key),
                )
            })?;

        let last = match guard.last {
            Some(last) => last,
            None => {
                let seeded = self.tokens.max_number(key).await?;
                guard.last = Some(seeded);
                seeded
            }
        };
        let number = last.map_or(TokenNumber::FIRST, |n| n.next());

        tracing::debug!(sequence_key = %key, token_number = %number, "Reserved token number");

        Ok(Box::new(InMemoryReservation {
            key: *key,
            number,
            guard,
            tokens: self.tokens.clone(),
        }))
    }
}

struct InMemoryReservation {
    key: SequenceKey,
    number: TokenNumber,
    guard: OwnedMutexGuard<KeyCounter>,
    tokens: Arc<dyn TokenRepository>,
}

impl SequenceReservation for InMemoryReservation {
    fn key(&self) -> &SequenceKey {
        &self.key
    }

    fn number(&self) -> TokenNumber {
        self.number
    }

    fn persist<'a>(self: Box<Self>, token: &'a Token) -> BoxFuture<'a, Result<(), DomainError>> {
        Box::pin(async move {
            ensure_matches(&*self, token)?;
            let InMemoryReservation {
                number,
                mut guard,
                tokens,
                ..
            } = *self;
            // The counter only advances once the token is stored.
            tokens.save(token).await?;
            guard.last = Some(Some(number));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryTokenRepository;
    use crate::domain::foundation::{DoctorId, PatientId, Timestamp};
    use crate::domain::queue::Token;

    fn key(doctor: DoctorId) -> SequenceKey {
        SequenceKey::new(doctor, IssueDay::today())
    }

    fn sequencer() -> InMemoryTokenSequencer {
        InMemoryTokenSequencer::new(Arc::new(InMemoryTokenRepository::new()))
    }

    fn token_for(reservation: &dyn SequenceReservation) -> Token {
        let key = reservation.key();
        let created_at = Timestamp::from_datetime(
            key.day
                .as_date()
                .and_hms_opt(9, 0, 0)
                .unwrap()
                .and_utc(),
        );
        Token::issue(reservation.number(), key.doctor_id, PatientId::new(), created_at)
    }

    async fn take(sequencer: &InMemoryTokenSequencer, key: &SequenceKey) -> u32 {
        let reservation = sequencer.next_number(key).await.unwrap();
        let number = reservation.number().value();
        let token = token_for(reservation.as_ref());
        reservation.persist(&token).await.unwrap();
        number
    }

    #[tokio::test]
    async fn numbers_start_at_one_and_increase() {
        let sequencer = sequencer();
        let key = key(DoctorId::new());

        assert_eq!(take(&sequencer, &key).await, 1);
        assert_eq!(take(&sequencer, &key).await, 2);
        assert_eq!(take(&sequencer, &key).await, 3);
    }

    #[tokio::test]
    async fn dropped_reservation_releases_its_number() {
        let sequencer = sequencer();
        let key = key(DoctorId::new());

        assert_eq!(take(&sequencer, &key).await, 1);

        let abandoned = sequencer.next_number(&key).await.unwrap();
        assert_eq!(abandoned.number().value(), 2);
        drop(abandoned);

        assert_eq!(take(&sequencer, &key).await, 2);
    }

    #[tokio::test]
    async fn persist_stores_the_token() {
        let repo = Arc::new(InMemoryTokenRepository::new());
        let sequencer = InMemoryTokenSequencer::new(repo.clone());
        let key = key(DoctorId::new());

        let reservation = sequencer.next_number(&key).await.unwrap();
        let token = token_for(reservation.as_ref());
        reservation.persist(&token).await.unwrap();

        assert_eq!(repo.find_by_id(token.id()).await.unwrap(), Some(token));
    }

    #[tokio::test]
    async fn mismatched_token_is_rejected_and_number_released() {
        let repo = Arc::new(InMemoryTokenRepository::new());
        let sequencer = InMemoryTokenSequencer::new(repo.clone());
        let key = key(DoctorId::new());

        let reservation = sequencer.next_number(&key).await.unwrap();
        let stray = Token::issue(
            TokenNumber::new(7).unwrap(),
            key.doctor_id,
            PatientId::new(),
            Timestamp::now(),
        );
        let err = reservation.persist(&stray).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(repo.find_by_id(stray.id()).await.unwrap().is_none());

        assert_eq!(take(&sequencer, &key).await, 1);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let sequencer = sequencer();
        let a = key(DoctorId::new());
        let b = key(DoctorId::new());

        let held = sequencer.next_number(&a).await.unwrap();
        // b is not blocked by a's outstanding reservation
        assert_eq!(take(&sequencer, &b).await, 1);
        let token = token_for(held.as_ref());
        held.persist(&token).await.unwrap();
        assert_eq!(take(&sequencer, &a).await, 2);
    }

    #[tokio::test]
    async fn busy_key_times_out_as_sequencing_unavailable() {
        let sequencer = InMemoryTokenSequencer::with_timeout(
            Arc::new(InMemoryTokenRepository::new()),
            Duration::from_millis(20),
        );
        let key = key(DoctorId::new());

        let _held = sequencer.next_number(&key).await.unwrap();
        let err = match sequencer.next_number(&key).await {
            Err(err) => err,
            Ok(_) => panic!("second reservation should time out"),
        };
        assert_eq!(err.code, ErrorCode::SequencingUnavailable);
    }

    #[tokio::test]
    async fn fresh_key_continues_from_persisted_tokens() {
        let repo = Arc::new(InMemoryTokenRepository::new());
        let doctor = DoctorId::new();
        let now = Timestamp::now();
        for n in 1..=4 {
            let token = Token::issue(TokenNumber::new(n).unwrap(), doctor, PatientId::new(), now);
            repo.save(&token).await.unwrap();
        }

        let sequencer = InMemoryTokenSequencer::new(repo);
        let key = SequenceKey::new(doctor, IssueDay::of(&now));
        assert_eq!(take(&sequencer, &key).await, 5);
    }

    #[tokio::test]
    async fn newer_day_evicts_idle_older_keys() {
        let sequencer = sequencer();
        let doctor = DoctorId::new();
        let today = Timestamp::now();
        let yesterday = SequenceKey::new(doctor, IssueDay::of(&today.add_days(-1)));
        let current = SequenceKey::new(doctor, IssueDay::of(&today));

        take(&sequencer, &yesterday).await;
        assert_eq!(sequencer.tracked_keys().await, 1);

        take(&sequencer, &current).await;
        assert_eq!(sequencer.tracked_keys().await, 1);
    }

    #[tokio::test]
    async fn concurrent_reservations_yield_contiguous_numbers() {
        let sequencer = Arc::new(sequencer());
        let key = key(DoctorId::new());

        let handles: Vec<_> = (0..25)
            .map(|_| {
                let sequencer = sequencer.clone();
                tokio::spawn(async move { take(&sequencer, &key).await })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=25).collect::<Vec<u32>>());
    }
}
