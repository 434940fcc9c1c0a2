//! PostgreSQL TokenSequencer built on a row lock.
//!
//! `token_sequences` holds one row per `(doctor, day)`. A reservation opens a
//! transaction and upserts that row, which takes its row lock; every other
//! issuer for the same key blocks on the lock until the reservation's
//! transaction commits or rolls back. Other keys lock other rows.
//!
//! The token row is inserted on the reservation's own transaction, so a
//! create holds exactly one pooled connection, and the counter and the token
//! become visible together or not at all.
//!
//! The upsert never trusts the counter alone: it takes the greater of the
//! stored counter and the highest number already in `tokens`, so a counter
//! that fell behind (manual insert, restored backup) heals itself on next use.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::queue::{SequenceKey, Token, TokenNumber};
use crate::ports::{ensure_matches, SequenceReservation, TokenSequencer};

use super::token_repository::{insert_token, number_from_db};
use super::{db_error, is_lock_timeout};

/// Row-locking sequencer.
#[derive(Clone)]
pub struct PostgresTokenSequencer {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresTokenSequencer {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }
}

#[async_trait]
impl TokenSequencer for PostgresTokenSequencer {
    async fn next_number(
        &self,
        key: &SequenceKey,
    ) -> Result<Box<dyn SequenceReservation>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin sequence transaction", e))?;

        // SET does not take bind parameters; the value is a plain integer.
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to set lock timeout", e))?;

        let next: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO token_sequences (doctor_id, issue_day, last_number)
            VALUES (
                $1, $2,
                (SELECT COALESCE(MAX(token_number), 0) FROM tokens
                  WHERE doctor_id = $1 AND issue_day = $2) + 1
            )
            ON CONFLICT (doctor_id, issue_day) DO UPDATE
            SET last_number = GREATEST(
                token_sequences.last_number,
                (SELECT COALESCE(MAX(token_number), 0) FROM tokens
                  WHERE doctor_id = $1 AND issue_day = $2)
            ) + 1
            RETURNING last_number
            "#,
        )
        .bind(key.doctor_id.as_uuid())
        .bind(key.day.as_date())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_lock_timeout(&e) {
                tracing::warn!(
                    sequence_key = %key,
                    timeout_ms = self.lock_timeout.as_millis() as u64,
                    "Timed out waiting for sequence row lock"
                );
                DomainError::new(
                    ErrorCode::SequencingUnavailable,
                    format!("Sequence for {} is busy", key),
                )
            } else {
                db_error("Failed to advance token sequence", e)
            }
        })?;

        let number = number_from_db(next)?;
        tracing::debug!(sequence_key = %key, token_number = %number, "Reserved token number");

        Ok(Box::new(PostgresReservation {
            key: *key,
            number,
            tx,
        }))
    }
}

/// Open transaction holding the sequence row lock.
///
/// Dropping it rolls the transaction back, which restores the counter and
/// releases the number.
struct PostgresReservation {
    key: SequenceKey,
    number: TokenNumber,
    tx: Transaction<'static, Postgres>,
}

impl SequenceReservation for PostgresReservation {
    fn key(&self) -> &SequenceKey {
        &self.key
    }

    fn number(&self) -> TokenNumber {
        self.number
    }

    fn persist<'a>(self: Box<Self>, token: &'a Token) -> BoxFuture<'a, Result<(), DomainError>> {
        Box::pin(async move {
            ensure_matches(&*self, token)?;
            let PostgresReservation { mut tx, .. } = *self;
            insert_token(&mut *tx, token).await?;
            tx.commit()
                .await
                .map_err(|e| db_error("Failed to commit token and sequence", e))
        })
    }
}
