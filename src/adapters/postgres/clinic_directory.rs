//! PostgreSQL implementation of ClinicDirectory.
//!
//! Doctors carry their login email from `users`; roles come from
//! `user_roles`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::clinic::{Doctor, Patient};
use crate::domain::foundation::{
    DoctorId, DomainError, ErrorCode, PatientId, Role, RoleSet, Timestamp, UserId,
};
use crate::ports::ClinicDirectory;

use super::{db_error, is_unique_violation};

const DOCTOR_SELECT: &str = r#"
    SELECT d.id, d.user_id, u.email, d.specialty, d.consultation_fee
    FROM doctors d
    JOIN users u ON u.id = d.user_id
"#;

const PATIENT_COLUMNS: &str = "id, name, email, phone, age, created_at";

/// PostgreSQL implementation of ClinicDirectory.
#[derive(Clone)]
pub struct PostgresClinicDirectory {
    pool: PgPool,
}

impl PostgresClinicDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClinicDirectory for PostgresClinicDirectory {
    async fn find_doctor(&self, id: &DoctorId) -> Result<Option<Doctor>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE d.id = $1", DOCTOR_SELECT))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to fetch doctor", e))?;

        row.map(row_to_doctor).transpose()
    }

    async fn find_patient(&self, id: &PatientId) -> Result<Option<Patient>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM patients WHERE id = $1",
            PATIENT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch patient", e))?;

        row.map(row_to_patient).transpose()
    }

    async fn find_patient_by_contact(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<Patient>, DomainError> {
        if email.is_none() && phone.is_none() {
            return Ok(None);
        }

        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM patients
            WHERE ($1::text IS NOT NULL AND lower(email) = lower($1))
               OR ($2::text IS NOT NULL AND phone = $2)
            LIMIT 1
            "#,
            PATIENT_COLUMNS
        ))
        .bind(email)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to look up patient by contact", e))?;

        row.map(row_to_patient).transpose()
    }

    async fn save_patient(&self, patient: &Patient) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO patients (id, name, email, phone, age, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(patient.id.as_uuid())
        .bind(&patient.name)
        .bind(patient.email.as_deref())
        .bind(patient.phone.as_deref())
        .bind(patient.age as i16)
        .bind(patient.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::new(
                    ErrorCode::Conflict,
                    "Patient with this email or phone already exists",
                )
            } else {
                db_error("Failed to insert patient", e)
            }
        })?;

        Ok(())
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM patients ORDER BY created_at",
            PATIENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list patients", e))?;

        rows.into_iter().map(row_to_patient).collect()
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, DomainError> {
        let rows = sqlx::query(&format!("{} ORDER BY u.email", DOCTOR_SELECT))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list doctors", e))?;

        rows.into_iter().map(row_to_doctor).collect()
    }

    async fn doctor_for_user(&self, user_id: &UserId) -> Result<Option<Doctor>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE d.user_id = $1", DOCTOR_SELECT))
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to fetch doctor for user", e))?;

        row.map(row_to_doctor).transpose()
    }

    async fn roles_for_user(&self, user_id: &UserId) -> Result<Option<RoleSet>, DomainError> {
        let rows: Vec<(Uuid, Option<String>)> = sqlx::query_as(
            r#"
            SELECT u.id, r.role
            FROM users u
            LEFT JOIN user_roles r ON r.user_id = u.id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch user roles", e))?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut roles = RoleSet::empty();
        for name in rows.into_iter().filter_map(|(_, role)| role) {
            match name.parse::<Role>() {
                Ok(role) => {
                    roles.insert(role);
                }
                Err(_) => tracing::warn!(user_id = %user_id, role = %name, "Ignoring unknown role"),
            }
        }
        Ok(Some(roles))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Row mapping
// ════════════════════════════════════════════════════════════════════════════

fn row_to_doctor(row: PgRow) -> Result<Doctor, DomainError> {
    let decode = |e: sqlx::Error| db_error("Failed to decode doctor row", e);

    Ok(Doctor {
        id: DoctorId::from_uuid(row.try_get("id").map_err(decode)?),
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(decode)?),
        email: row.try_get("email").map_err(decode)?,
        specialty: row.try_get("specialty").map_err(decode)?,
        consultation_fee: row.try_get("consultation_fee").map_err(decode)?,
    })
}

fn row_to_patient(row: PgRow) -> Result<Patient, DomainError> {
    let decode = |e: sqlx::Error| db_error("Failed to decode patient row", e);

    let age: i16 = row.try_get("age").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;

    Ok(Patient {
        id: PatientId::from_uuid(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        phone: row.try_get("phone").map_err(decode)?,
        age: u16::try_from(age).map_err(|_| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid patient age in storage: {}", age),
            )
        })?,
        created_at: Timestamp::from_datetime(created_at),
    })
}
