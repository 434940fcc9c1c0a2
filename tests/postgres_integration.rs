//! Integration tests for the PostgreSQL adapters.
//!
//! These need a running PostgreSQL and are ignored by default:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/clinic_queue_test cargo test -- --ignored
//! ```
//!
//! Every test works on freshly created doctors, so the suite can share one
//! database and run in parallel.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use clinic_queue::adapters::postgres::{
    PostgresClinicDirectory, PostgresTokenRepository, PostgresTokenSequencer,
};
use clinic_queue::adapters::websocket::{BroadcastHub, HubConfig};
use clinic_queue::application::{CreateTokenCommand, QueueService, QueueServicePorts};
use clinic_queue::domain::clinic::{NewPatient, Patient};
use clinic_queue::domain::foundation::{
    DoctorId, DomainError, ErrorCode, PatientId, Role, RoleSet, Timestamp, UserId,
};
use clinic_queue::domain::queue::{
    IssueDay, QueueError, SequenceKey, Token, TokenNumber, TokenStateMachine, TokenStatus,
};
use clinic_queue::ports::{ClinicDirectory, TokenRepository, TokenSequencer};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Pool sized like the default deployment.
async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&url)
        .await
        .expect("Failed to connect to PostgreSQL");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

async fn insert_doctor(pool: &PgPool) -> DoctorId {
    let user = UserId::new();
    let doctor = DoctorId::new();
    sqlx::query("INSERT INTO users (id, email) VALUES ($1, $2)")
        .bind(user.as_uuid())
        .bind(format!("dr-{}@clinic.example", user))
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO doctors (id, user_id, specialty) VALUES ($1, $2, 'General')")
        .bind(doctor.as_uuid())
        .bind(user.as_uuid())
        .execute(pool)
        .await
        .unwrap();
    doctor
}

async fn insert_patient(directory: &PostgresClinicDirectory) -> PatientId {
    let patient = Patient::register(NewPatient {
        name: "Asha Menon".to_string(),
        email: None,
        phone: None,
        age: 40,
    })
    .unwrap();
    directory.save_patient(&patient).await.unwrap();
    patient.id
}

struct Clinic {
    pool: PgPool,
    service: Arc<QueueService>,
    tokens: Arc<PostgresTokenRepository>,
    directory: Arc<PostgresClinicDirectory>,
}

impl Clinic {
    async fn new() -> Self {
        let pool = pool().await;
        let tokens = Arc::new(PostgresTokenRepository::new(pool.clone()));
        let directory = Arc::new(PostgresClinicDirectory::new(pool.clone()));
        let hub = Arc::new(BroadcastHub::new(HubConfig::default()));
        let sequencer = Arc::new(PostgresTokenSequencer::new(
            pool.clone(),
            Duration::from_millis(2000),
        ));

        let service = Arc::new(QueueService::new(QueueServicePorts {
            tokens: tokens.clone(),
            directory: directory.clone(),
            sequencer,
            publisher: hub.clone(),
            subscribers: hub,
        }));

        Self {
            pool,
            service,
            tokens,
            directory,
        }
    }

    async fn issue(&self, doctor_id: DoctorId, patient_id: PatientId) -> Result<Token, QueueError> {
        self.service
            .create_token(
                CreateTokenCommand {
                    patient_id,
                    doctor_id,
                },
                &RoleSet::of(&[Role::Staff]),
            )
            .await
    }
}

fn token(doctor: DoctorId, patient: PatientId, number: u32) -> Token {
    Token::issue(
        TokenNumber::new(number).unwrap(),
        doctor,
        patient,
        Timestamp::now(),
    )
}

// =============================================================================
// Sequencing
// =============================================================================

#[tokio::test]
#[ignore = "Requires live PostgreSQL instance"]
async fn concurrent_creates_for_one_doctor_are_contiguous() {
    let clinic = Clinic::new().await;
    let doctor = insert_doctor(&clinic.pool).await;
    let patient = insert_patient(&clinic.directory).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let service = clinic.service.clone();
            tokio::spawn(async move {
                service
                    .create_token(
                        CreateTokenCommand {
                            patient_id: patient,
                            doctor_id: doctor,
                        },
                        &RoleSet::of(&[Role::Staff]),
                    )
                    .await
            })
        })
        .collect();

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().unwrap().number().value());
    }
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=20).collect::<Vec<u32>>());
}

#[tokio::test]
#[ignore = "Requires live PostgreSQL instance"]
async fn concurrent_creates_across_more_doctors_than_connections() {
    let clinic = Clinic::new().await;
    let patient = insert_patient(&clinic.directory).await;
    let mut doctors = Vec::new();
    for _ in 0..40 {
        doctors.push(insert_doctor(&clinic.pool).await);
    }

    let handles: Vec<_> = doctors
        .iter()
        .map(|&doctor| {
            let service = clinic.service.clone();
            tokio::spawn(async move {
                service
                    .create_token(
                        CreateTokenCommand {
                            patient_id: patient,
                            doctor_id: doctor,
                        },
                        &RoleSet::of(&[Role::Staff]),
                    )
                    .await
            })
        })
        .collect();

    for handle in handles {
        let token = handle.await.unwrap().unwrap();
        assert_eq!(token.number().value(), 1);
    }
}

#[tokio::test]
#[ignore = "Requires live PostgreSQL instance"]
async fn counter_behind_stored_tokens_heals() {
    let clinic = Clinic::new().await;
    let doctor = insert_doctor(&clinic.pool).await;
    let patient = insert_patient(&clinic.directory).await;

    assert_eq!(clinic.issue(doctor, patient).await.unwrap().number().value(), 1);

    // Rows written around the sequencer leave the counter at 1.
    clinic.tokens.save(&token(doctor, patient, 2)).await.unwrap();
    clinic.tokens.save(&token(doctor, patient, 3)).await.unwrap();

    assert_eq!(clinic.issue(doctor, patient).await.unwrap().number().value(), 4);
}

#[tokio::test]
#[ignore = "Requires live PostgreSQL instance"]
async fn busy_sequence_row_times_out_and_number_is_released() {
    let pool = pool().await;
    let directory = PostgresClinicDirectory::new(pool.clone());
    let sequencer = PostgresTokenSequencer::new(pool.clone(), Duration::from_millis(100));
    let doctor = insert_doctor(&pool).await;
    let patient = insert_patient(&directory).await;
    let key = SequenceKey::new(doctor, IssueDay::today());

    let held = sequencer.next_number(&key).await.unwrap();
    assert_eq!(held.number().value(), 1);

    let err = match sequencer.next_number(&key).await {
        Err(err) => err,
        Ok(_) => panic!("second reservation should time out"),
    };
    assert_eq!(err.code, ErrorCode::SequencingUnavailable);
    assert_eq!(QueueError::from(err), QueueError::SequencingUnavailable);

    // The rollback is flushed when the connection goes back to the pool.
    drop(held);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let reservation = sequencer.next_number(&key).await.unwrap();
    assert_eq!(reservation.number().value(), 1);
    let issued = token(doctor, patient, 1);
    reservation.persist(&issued).await.unwrap();

    let tokens = PostgresTokenRepository::new(pool);
    assert_eq!(tokens.max_number(&key).await.unwrap().map(|n| n.value()), Some(1));
}

#[tokio::test]
#[ignore = "Requires live PostgreSQL instance"]
async fn failed_insert_rolls_back_the_counter() {
    let clinic = Clinic::new().await;
    let doctor = insert_doctor(&clinic.pool).await;
    let patient = insert_patient(&clinic.directory).await;
    let sequencer = PostgresTokenSequencer::new(clinic.pool.clone(), Duration::from_millis(2000));
    let key = SequenceKey::new(doctor, IssueDay::today());

    // The patient does not exist, so the insert fails on its foreign key.
    let reservation = sequencer.next_number(&key).await.unwrap();
    let orphan = token(doctor, PatientId::new(), reservation.number().value());
    let err: DomainError = reservation.persist(&orphan).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::DatabaseError);

    assert_eq!(clinic.issue(doctor, patient).await.unwrap().number().value(), 1);
}

// =============================================================================
// Token repository
// =============================================================================

#[tokio::test]
#[ignore = "Requires live PostgreSQL instance"]
async fn duplicate_number_is_a_conflict() {
    let clinic = Clinic::new().await;
    let doctor = insert_doctor(&clinic.pool).await;
    let patient = insert_patient(&clinic.directory).await;

    clinic.tokens.save(&token(doctor, patient, 1)).await.unwrap();
    let err = clinic
        .tokens
        .save(&token(doctor, patient, 1))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[tokio::test]
#[ignore = "Requires live PostgreSQL instance"]
async fn status_update_is_compare_and_set() {
    let clinic = Clinic::new().await;
    let doctor = insert_doctor(&clinic.pool).await;
    let patient = insert_patient(&clinic.directory).await;
    let issued = clinic.issue(doctor, patient).await.unwrap();

    let started = TokenStateMachine::apply(&issued, TokenStatus::InProgress, &doctor).unwrap();
    clinic
        .tokens
        .update_status(&started, TokenStatus::Waiting)
        .await
        .unwrap();

    // A second writer that also read `waiting` loses.
    let completed = TokenStateMachine::apply(&issued, TokenStatus::Completed, &doctor).unwrap();
    let err = clinic
        .tokens
        .update_status(&completed, TokenStatus::Waiting)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);

    let stored = clinic.tokens.find_by_id(issued.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), TokenStatus::InProgress);

    let missing = token(doctor, patient, 99);
    let err = clinic
        .tokens
        .update_status(&missing, TokenStatus::Waiting)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TokenNotFound);
}
