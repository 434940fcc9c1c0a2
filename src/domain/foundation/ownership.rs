//! Ownership predicate for doctor-owned resources.
//!
//! Only the doctor named on a resource may change it. This is a distinct
//! check from role authorization: holding the doctor role says nothing about
//! which doctor's queue the caller may touch.

use super::{DomainError, DoctorId, ErrorCode};

/// Trait for aggregates that belong to exactly one doctor.
///
/// # Example
///
/// ```ignore
/// impl OwnedByDoctor for Token {
///     fn owning_doctor(&self) -> &DoctorId {
///         &self.doctor_id
///     }
/// }
///
/// token.check_ownership(&acting_doctor)?;
/// ```
pub trait OwnedByDoctor {
    /// Returns the doctor the resource belongs to.
    fn owning_doctor(&self) -> &DoctorId;

    /// Returns `true` if `doctor_id` owns this resource.
    fn is_owned_by(&self, doctor_id: &DoctorId) -> bool {
        self.owning_doctor() == doctor_id
    }

    /// Validates ownership, returning `Forbidden` if `doctor_id` is not the owner.
    fn check_ownership(&self, doctor_id: &DoctorId) -> Result<(), DomainError> {
        if self.is_owned_by(doctor_id) {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::Forbidden,
                "Doctor does not own this resource",
            )
            .with_detail("owner_id", self.owning_doctor().to_string())
            .with_detail("requested_by", doctor_id.to_string()))
        }
    }
}
