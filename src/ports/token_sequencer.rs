//! Token sequencer port.
//!
//! Hands out the next token number for a `(doctor, day)` key. Numbering is
//! two-phase: `next_number` returns a [`SequenceReservation`] that keeps the
//! key locked, and the caller hands the issued token back to
//! [`SequenceReservation::persist`], which stores the token and advances the
//! counter as one unit. Dropping an unpersisted reservation gives the number
//! back, so the stored numbers for a key are always exactly `1..=N`.
//!
//! ```ignore
//! let reservation = sequencer.next_number(&key).await?;
//! let token = Token::issue(reservation.number(), doctor_id, patient_id, created_at);
//! reservation.persist(&token).await?;  // on error nothing is stored
//! ```

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::queue::{SequenceKey, Token, TokenNumber};

/// Serializes number assignment per sequence key.
///
/// # Contract
///
/// - Callers sharing a key are served one at a time; the Nth persisted
///   reservation for a key carries number N
/// - Different keys never block each other
/// - Waiting for a key is bounded; on expiry return `SequencingUnavailable`
///   and never skip a number
#[async_trait]
pub trait TokenSequencer: Send + Sync {
    /// Reserve the next number for `key`.
    ///
    /// # Errors
    ///
    /// - `SequencingUnavailable` if the key could not be locked in time
    /// - `DatabaseError` if the current maximum could not be read
    async fn next_number(
        &self,
        key: &SequenceKey,
    ) -> Result<Box<dyn SequenceReservation>, DomainError>;
}

/// A number held under its key's lock until persisted or dropped.
pub trait SequenceReservation: Send {
    fn key(&self) -> &SequenceKey;

    fn number(&self) -> TokenNumber;

    /// Store `token` and make the reserved number permanent, then release the
    /// key. Either both happen or neither does.
    ///
    /// `token` must carry this reservation's key and number.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `token` does not match the reservation
    /// - `Conflict` if the number is already taken for the key
    /// - `DatabaseError` on persistence failure
    fn persist<'a>(self: Box<Self>, token: &'a Token) -> BoxFuture<'a, Result<(), DomainError>>;
}

/// Rejects a token that was not issued from `reservation`.
pub fn ensure_matches(
    reservation: &dyn SequenceReservation,
    token: &Token,
) -> Result<(), DomainError> {
    if token.number() == reservation.number() && token.sequence_key() == *reservation.key() {
        Ok(())
    } else {
        Err(DomainError::new(
            ErrorCode::ValidationFailed,
            format!(
                "Token {} for {} does not match reservation {} for {}",
                token.number(),
                token.sequence_key(),
                reservation.number(),
                reservation.key()
            ),
        ))
    }
}
