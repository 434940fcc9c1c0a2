//! QueueService - orchestrates access checks, sequencing, the status state
//! machine, persistence and broadcasting.
//!
//! Writes and notifications are failure-independent: once a write has
//! succeeded, nothing that happens while publishing can turn it into an
//! error for the caller.

use std::sync::Arc;

use crate::domain::clinic::{Doctor, NewPatient, Patient};
use crate::domain::foundation::{AccessGate, Actor, DoctorId, RoleSet, Timestamp};
use crate::domain::queue::{
    IssueDay, QueueError, QueueEvent, Resource, SequenceKey, Token, TokenStateMachine,
};
use crate::ports::{
    ClinicDirectory, ConnectionId, QueueEventPublisher, SubscriberConnection, SubscriberRegistry,
    TokenRepository, TokenSequencer,
};

use super::{CreateTokenCommand, UpdateTokenStatusCommand};

/// Collaborators the queue service is wired with.
#[derive(Clone)]
pub struct QueueServicePorts {
    pub tokens: Arc<dyn TokenRepository>,
    pub directory: Arc<dyn ClinicDirectory>,
    pub sequencer: Arc<dyn TokenSequencer>,
    pub publisher: Arc<dyn QueueEventPublisher>,
    pub subscribers: Arc<dyn SubscriberRegistry>,
}

/// Entry point for every queue operation.
pub struct QueueService {
    tokens: Arc<dyn TokenRepository>,
    directory: Arc<dyn ClinicDirectory>,
    sequencer: Arc<dyn TokenSequencer>,
    publisher: Arc<dyn QueueEventPublisher>,
    subscribers: Arc<dyn SubscriberRegistry>,
}

fn require(actor_roles: &RoleSet, required: &RoleSet) -> Result<(), QueueError> {
    if AccessGate::authorize(actor_roles, required) {
        Ok(())
    } else {
        Err(QueueError::forbidden(format!(
            "requires one of {}, actor has {}",
            required, actor_roles
        )))
    }
}

impl QueueService {
    pub fn new(ports: QueueServicePorts) -> Self {
        Self {
            tokens: ports.tokens,
            directory: ports.directory,
            sequencer: ports.sequencer,
            publisher: ports.publisher,
            subscribers: ports.subscribers,
        }
    }

    // ════════════════════════════════════════════════════════════════════
    // Core commands
    // ════════════════════════════════════════════════════════════════════

    /// Issues the next token for `cmd.doctor_id` today.
    ///
    /// Requires a front-desk role (staff or admin).
    pub async fn create_token(
        &self,
        cmd: CreateTokenCommand,
        actor_roles: &RoleSet,
    ) -> Result<Token, QueueError> {
        // 1. Check access
        require(actor_roles, &AccessGate::front_desk())?;

        // 2. Resolve references
        let doctor = self
            .directory
            .find_doctor(&cmd.doctor_id)
            .await?
            .ok_or_else(|| QueueError::not_found(Resource::Doctor, cmd.doctor_id))?;
        let patient = self
            .directory
            .find_patient(&cmd.patient_id)
            .await?
            .ok_or_else(|| QueueError::not_found(Resource::Patient, cmd.patient_id))?;

        // 3. Reserve a number; created_at fixes the issue day
        let created_at = Timestamp::now();
        let key = SequenceKey::new(doctor.id, IssueDay::of(&created_at));
        let reservation = self.sequencer.next_number(&key).await?;

        // 4. Persist through the reservation; on failure nothing is stored
        //    and the number is released
        let token = Token::issue(reservation.number(), doctor.id, patient.id, created_at);
        reservation.persist(&token).await?;

        tracing::info!(
            token_id = %token.id(),
            token_number = %token.number(),
            doctor_id = %token.doctor_id(),
            "Token issued"
        );

        // 5. Publish; never affects the result
        self.publish(QueueEvent::token_created(&token, Some(patient.name)))
            .await;

        Ok(token)
    }

    /// Moves a token to a new status on behalf of `acting_doctor`.
    ///
    /// The caller is responsible for having established that the actor holds
    /// the doctor role; see [`update_status_as`](Self::update_status_as).
    pub async fn update_status(
        &self,
        cmd: UpdateTokenStatusCommand,
        acting_doctor: &DoctorId,
    ) -> Result<Token, QueueError> {
        // 1. Load
        let token = self
            .tokens
            .find_by_id(&cmd.token_id)
            .await?
            .ok_or_else(|| QueueError::not_found(Resource::Token, cmd.token_id))?;

        // 2. Validate ownership and transition
        let updated = TokenStateMachine::apply(&token, cmd.status, acting_doctor)?;

        // 3. Persist, guarded against a concurrent change
        self.tokens.update_status(&updated, token.status()).await?;

        tracing::info!(
            token_id = %updated.id(),
            from = %token.status(),
            to = %updated.status(),
            "Token status updated"
        );

        // 4. Publish; never affects the result
        let patient_name = match self.directory.find_patient(updated.patient_id()).await {
            Ok(patient) => patient.map(|p| p.name),
            Err(e) => {
                tracing::debug!(error = %e, "Patient lookup for event failed");
                None
            }
        };
        self.publish(QueueEvent::status_updated(&updated, patient_name))
            .await;

        Ok(updated)
    }

    /// Status update by an authenticated actor.
    ///
    /// Requires the doctor role and a doctor record linked to the actor.
    pub async fn update_status_as(
        &self,
        actor: &Actor,
        cmd: UpdateTokenStatusCommand,
    ) -> Result<Token, QueueError> {
        require(&actor.roles, &AccessGate::clinician())?;
        let doctor_id = self.resolve_doctor(actor).await?;
        self.update_status(cmd, &doctor_id).await
    }

    // ════════════════════════════════════════════════════════════════════
    // Subscribers
    // ════════════════════════════════════════════════════════════════════

    pub async fn register_subscriber(&self, connection: Arc<dyn SubscriberConnection>) {
        self.subscribers.register(connection).await;
    }

    pub async fn unregister_subscriber(&self, id: ConnectionId) {
        self.subscribers.unregister(id).await;
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.subscriber_count().await
    }

    // ════════════════════════════════════════════════════════════════════
    // Directory and read models
    // ════════════════════════════════════════════════════════════════════

    /// Registers a patient. Requires a front-desk role.
    pub async fn register_patient(
        &self,
        actor: &Actor,
        input: NewPatient,
    ) -> Result<Patient, QueueError> {
        require(&actor.roles, &AccessGate::front_desk())?;

        let patient = Patient::register(input)?;

        let existing = self
            .directory
            .find_patient_by_contact(patient.email.as_deref(), patient.phone.as_deref())
            .await?;
        if existing.is_some() {
            return Err(QueueError::conflict(
                "Patient with this email or phone already exists",
            ));
        }

        self.directory.save_patient(&patient).await?;
        tracing::info!(patient_id = %patient.id, "Patient registered");
        Ok(patient)
    }

    pub async fn list_patients(&self, actor: &Actor) -> Result<Vec<Patient>, QueueError> {
        require(&actor.roles, &AccessGate::front_desk())?;
        Ok(self.directory.list_patients().await?)
    }

    pub async fn list_doctors(&self, actor: &Actor) -> Result<Vec<Doctor>, QueueError> {
        require(&actor.roles, &AccessGate::front_desk())?;
        Ok(self.directory.list_doctors().await?)
    }

    /// Every token in the acting doctor's queue, oldest first.
    pub async fn doctor_tokens(&self, actor: &Actor) -> Result<Vec<Token>, QueueError> {
        require(&actor.roles, &AccessGate::clinician())?;
        let doctor_id = self.resolve_doctor(actor).await?;
        Ok(self.tokens.list_by_doctor(&doctor_id).await?)
    }

    /// Tokens issued today across all doctors. Requires a front-desk role.
    pub async fn today_tokens(&self, actor: &Actor) -> Result<Vec<Token>, QueueError> {
        require(&actor.roles, &AccessGate::front_desk())?;
        Ok(self.tokens.list_issued_on(IssueDay::today()).await?)
    }

    /// Today's tokens that are still open, for the waiting-room display.
    pub async fn public_board(&self) -> Result<Vec<Token>, QueueError> {
        let tokens = self.tokens.list_issued_on(IssueDay::today()).await?;
        Ok(tokens
            .into_iter()
            .filter(|t| t.status().is_open())
            .collect())
    }

    // ════════════════════════════════════════════════════════════════════
    // Helpers
    // ════════════════════════════════════════════════════════════════════

    async fn resolve_doctor(&self, actor: &Actor) -> Result<DoctorId, QueueError> {
        if let Some(doctor_id) = actor.doctor_id {
            return Ok(doctor_id);
        }
        self.directory
            .doctor_for_user(&actor.user_id)
            .await?
            .map(|d| d.id)
            .ok_or_else(|| QueueError::not_found(Resource::Doctor, actor.user_id))
    }

    async fn publish(&self, event: QueueEvent) {
        match self.publisher.publish(&event).await {
            Ok(report) if report.failed > 0 => {
                tracing::debug!(
                    token_id = %event.token_id,
                    delivered = report.delivered,
                    failed = report.failed,
                    "Some subscribers were dropped"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(token_id = %event.token_id, error = %e, "Failed to publish queue event");
            }
        }
    }
}
