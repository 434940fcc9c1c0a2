//! Clinic directory port.
//!
//! Read access to doctors and users, plus patient registration. The queue
//! only needs to know that referenced records exist, which doctor record a
//! login user maps to, and which roles that user holds.

use async_trait::async_trait;

use crate::domain::clinic::{Doctor, Patient};
use crate::domain::foundation::{DoctorId, DomainError, PatientId, RoleSet, UserId};

#[async_trait]
pub trait ClinicDirectory: Send + Sync {
    async fn find_doctor(&self, id: &DoctorId) -> Result<Option<Doctor>, DomainError>;

    async fn find_patient(&self, id: &PatientId) -> Result<Option<Patient>, DomainError>;

    /// Find a patient sharing either contact detail.
    ///
    /// Returns `None` when both arguments are `None`.
    async fn find_patient_by_contact(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<Patient>, DomainError>;

    /// Save a newly registered patient.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the email or phone is already registered
    /// - `DatabaseError` on persistence failure
    async fn save_patient(&self, patient: &Patient) -> Result<(), DomainError>;

    /// All patients, oldest registration first.
    async fn list_patients(&self) -> Result<Vec<Patient>, DomainError>;

    /// All doctors, ordered by email.
    async fn list_doctors(&self) -> Result<Vec<Doctor>, DomainError>;

    /// Doctor record linked to a login user.
    async fn doctor_for_user(&self, user_id: &UserId) -> Result<Option<Doctor>, DomainError>;

    /// Roles held by a login user.
    ///
    /// Returns `None` if the user does not exist, and an empty set for a user
    /// without roles.
    async fn roles_for_user(&self, user_id: &UserId) -> Result<Option<RoleSet>, DomainError>;
}
