//! In-memory implementation of ClinicDirectory.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::clinic::{Doctor, Patient};
use crate::domain::foundation::{
    DoctorId, DomainError, ErrorCode, PatientId, RoleSet, UserId,
};
use crate::ports::ClinicDirectory;

/// Directory of users, doctors and patients held in memory.
///
/// Users and doctors are seeded with [`add_user`](Self::add_user) and
/// [`add_doctor`](Self::add_doctor); patients arrive through registration.
#[derive(Debug, Default)]
pub struct InMemoryClinicDirectory {
    users: RwLock<HashMap<UserId, RoleSet>>,
    doctors: RwLock<HashMap<DoctorId, Doctor>>,
    patients: RwLock<Vec<Patient>>,
}

impl InMemoryClinicDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a login user and its roles.
    pub async fn add_user(&self, user_id: UserId, roles: RoleSet) {
        self.users.write().await.insert(user_id, roles);
    }

    /// Adds a doctor record.
    ///
    /// The linked user must be added separately with [`add_user`](Self::add_user).
    pub async fn add_doctor(&self, doctor: Doctor) {
        self.doctors.write().await.insert(doctor.id, doctor);
    }
}

fn same_contact(patient: &Patient, email: Option<&str>, phone: Option<&str>) -> bool {
    let email_match = matches!((patient.email.as_deref(), email), (Some(a), Some(b)) if a.eq_ignore_ascii_case(b));
    let phone_match = matches!((patient.phone.as_deref(), phone), (Some(a), Some(b)) if a == b);
    email_match || phone_match
}

#[async_trait]
impl ClinicDirectory for InMemoryClinicDirectory {
    async fn find_doctor(&self, id: &DoctorId) -> Result<Option<Doctor>, DomainError> {
        Ok(self.doctors.read().await.get(id).cloned())
    }

    async fn find_patient(&self, id: &PatientId) -> Result<Option<Patient>, DomainError> {
        Ok(self
            .patients
            .read()
            .await
            .iter()
            .find(|p| p.id == *id)
            .cloned())
    }

    async fn find_patient_by_contact(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<Patient>, DomainError> {
        if email.is_none() && phone.is_none() {
            return Ok(None);
        }
        Ok(self
            .patients
            .read()
            .await
            .iter()
            .find(|p| same_contact(p, email, phone))
            .cloned())
    }

    async fn save_patient(&self, patient: &Patient) -> Result<(), DomainError> {
        let mut patients = self.patients.write().await;
        let duplicate = patients.iter().any(|p| {
            p.id == patient.id || same_contact(p, patient.email.as_deref(), patient.phone.as_deref())
        });
        if duplicate {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                "Patient with this email or phone already exists",
            ));
        }
        patients.push(patient.clone());
        Ok(())
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, DomainError> {
        Ok(self.patients.read().await.clone())
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, DomainError> {
        let mut doctors: Vec<Doctor> = self.doctors.read().await.values().cloned().collect();
        doctors.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(doctors)
    }

    async fn doctor_for_user(&self, user_id: &UserId) -> Result<Option<Doctor>, DomainError> {
        Ok(self
            .doctors
            .read()
            .await
            .values()
            .find(|d| d.user_id == *user_id)
            .cloned())
    }

    async fn roles_for_user(&self, user_id: &UserId) -> Result<Option<RoleSet>, DomainError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }
}
