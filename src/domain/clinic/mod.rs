//! Clinic directory domain - doctors and patients the queue refers to.

mod doctor;
mod patient;

pub use doctor::Doctor;
pub use patient::{NewPatient, Patient};
