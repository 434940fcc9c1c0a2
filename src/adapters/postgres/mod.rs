//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresTokenRepository` - Token rows, status compare-and-set
//! - `PostgresClinicDirectory` - Users, roles, doctors and patients
//! - `PostgresTokenSequencer` - Row-locked per-doctor daily counter

mod clinic_directory;
mod token_repository;
mod token_sequencer;

pub use clinic_directory::PostgresClinicDirectory;
pub use token_repository::PostgresTokenRepository;
pub use token_sequencer::PostgresTokenSequencer;

use crate::domain::foundation::{DomainError, ErrorCode};

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for `lock_not_available`, raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(UNIQUE_VIOLATION)
}

fn is_lock_timeout(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(LOCK_NOT_AVAILABLE)
}

fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
}
