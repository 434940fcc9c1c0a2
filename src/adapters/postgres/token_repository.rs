//! PostgreSQL implementation of TokenRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{
    DoctorId, DomainError, ErrorCode, PatientId, Timestamp, TokenId,
};
use crate::domain::queue::{IssueDay, SequenceKey, Token, TokenNumber, TokenStatus};
use crate::ports::TokenRepository;

use super::{db_error, is_unique_violation};

const TOKEN_COLUMNS: &str = "id, token_number, doctor_id, patient_id, status, created_at";

/// PostgreSQL implementation of TokenRepository.
#[derive(Clone)]
pub struct PostgresTokenRepository {
    pool: PgPool,
}

impl PostgresTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    async fn save(&self, token: &Token) -> Result<(), DomainError> {
        insert_token(&self.pool, token).await
    }

    async fn update_status(
        &self,
        token: &Token,
        previous: TokenStatus,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE tokens SET status = $2 WHERE id = $1 AND status = $3")
            .bind(token.id().as_uuid())
            .bind(token.status().as_str())
            .bind(previous.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update token status", e))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing matched: either the token is gone or someone moved it first.
        match self.find_by_id(token.id()).await? {
            Some(stored) => Err(DomainError::new(
                ErrorCode::Conflict,
                format!(
                    "Token {} is {}, expected {}",
                    token.id(),
                    stored.status(),
                    previous
                ),
            )),
            None => Err(DomainError::new(
                ErrorCode::TokenNotFound,
                format!("Token not found: {}", token.id()),
            )
            .with_detail("id", token.id().to_string())),
        }
    }

    async fn find_by_id(&self, id: &TokenId) -> Result<Option<Token>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM tokens WHERE id = $1", TOKEN_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to fetch token", e))?;

        row.map(row_to_token).transpose()
    }

    async fn max_number(&self, key: &SequenceKey) -> Result<Option<TokenNumber>, DomainError> {
        let max: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(token_number) FROM tokens WHERE doctor_id = $1 AND issue_day = $2",
        )
        .bind(key.doctor_id.as_uuid())
        .bind(key.day.as_date())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to read highest token number", e))?;

        max.map(number_from_db).transpose()
    }

    async fn list_by_doctor(&self, doctor_id: &DoctorId) -> Result<Vec<Token>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tokens WHERE doctor_id = $1 ORDER BY created_at, token_number",
            TOKEN_COLUMNS
        ))
        .bind(doctor_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch tokens by doctor", e))?;

        rows.into_iter().map(row_to_token).collect()
    }

    async fn list_issued_on(&self, day: IssueDay) -> Result<Vec<Token>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tokens WHERE issue_day = $1 ORDER BY created_at, token_number",
            TOKEN_COLUMNS
        ))
        .bind(day.as_date())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch tokens by day", e))?;

        rows.into_iter().map(row_to_token).collect()
    }
}

/// Inserts a token row on any executor, so a sequence reservation can write
/// the token inside its own transaction.
pub(super) async fn insert_token<'e, E>(executor: E, token: &Token) -> Result<(), DomainError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO tokens (
            id, token_number, doctor_id, patient_id, status, issue_day, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(token.id().as_uuid())
    .bind(number_to_db(token.number())?)
    .bind(token.doctor_id().as_uuid())
    .bind(token.patient_id().as_uuid())
    .bind(token.status().as_str())
    .bind(token.issue_day().as_date())
    .bind(token.created_at().as_datetime())
    .execute(executor)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            DomainError::new(
                ErrorCode::Conflict,
                format!(
                    "Token number {} already issued for {}",
                    token.number(),
                    token.sequence_key()
                ),
            )
        } else {
            db_error("Failed to insert token", e)
        }
    })?;

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Row mapping
// ════════════════════════════════════════════════════════════════════════════

fn row_to_token(row: PgRow) -> Result<Token, DomainError> {
    let decode = |e: sqlx::Error| db_error("Failed to decode token row", e);

    let id: Uuid = row.try_get("id").map_err(decode)?;
    let number: i32 = row.try_get("token_number").map_err(decode)?;
    let doctor_id: Uuid = row.try_get("doctor_id").map_err(decode)?;
    let patient_id: Uuid = row.try_get("patient_id").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;

    let status = status.parse::<TokenStatus>().map_err(|e| {
        DomainError::new(ErrorCode::DatabaseError, format!("Invalid token status: {}", e))
    })?;

    Ok(Token::reconstitute(
        TokenId::from_uuid(id),
        number_from_db(number)?,
        DoctorId::from_uuid(doctor_id),
        PatientId::from_uuid(patient_id),
        status,
        Timestamp::from_datetime(created_at),
    ))
}

pub(super) fn number_to_db(number: TokenNumber) -> Result<i32, DomainError> {
    i32::try_from(number.value()).map_err(|_| {
        DomainError::new(
            ErrorCode::ValidationFailed,
            format!("Token number {} out of range", number),
        )
    })
}

pub(super) fn number_from_db(value: i32) -> Result<TokenNumber, DomainError> {
    u32::try_from(value)
        .ok()
        .and_then(|v| TokenNumber::new(v).ok())
        .ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid token number in storage: {}", value),
            )
        })
}
