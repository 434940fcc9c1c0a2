//! Patient record and registration input.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PatientId, Timestamp, ValidationError};

const MIN_NAME_LEN: usize = 2;
const MAX_AGE: i64 = 150;

/// Registration request for a new patient, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub age: i64,
}

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: u16,
    pub created_at: Timestamp,
}

impl Patient {
    /// Validates a registration and creates the patient.
    ///
    /// Blank contact fields are treated as absent.
    pub fn register(input: NewPatient) -> Result<Self, ValidationError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if name.chars().count() < MIN_NAME_LEN {
            return Err(ValidationError::invalid_format(
                "name",
                format!("must be at least {} characters", MIN_NAME_LEN),
            ));
        }
        if input.age < 1 || input.age > MAX_AGE {
            return Err(ValidationError::out_of_range("age", 1, MAX_AGE, input.age));
        }

        let email = normalize(input.email);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(ValidationError::invalid_format("email", "missing '@'"));
            }
        }

        Ok(Self {
            id: PatientId::new(),
            name,
            email,
            phone: normalize(input.phone),
            age: input.age as u16,
            created_at: Timestamp::now(),
        })
    }
}

fn normalize(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, age: i64) -> NewPatient {
        NewPatient {
            name: name.to_string(),
            email: None,
            phone: None,
            age,
        }
    }

    #[test]
    fn registers_valid_patient() {
        let patient = Patient::register(NewPatient {
            email: Some("asha@example.com".to_string()),
            phone: Some("  ".to_string()),
            ..input("  Asha  ", 34)
        })
        .unwrap();

        assert_eq!(patient.name, "Asha");
        assert_eq!(patient.age, 34);
        assert_eq!(patient.email.as_deref(), Some("asha@example.com"));
        assert!(patient.phone.is_none());
    }

    #[test]
    fn rejects_short_name() {
        let err = Patient::register(input("A", 30)).unwrap_err();
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn rejects_blank_name() {
        let err = Patient::register(input("   ", 30)).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyField { .. }));
    }

    #[test]
    fn rejects_non_positive_age() {
        let err = Patient::register(input("Ravi", 0)).unwrap_err();
        assert_eq!(err.field(), "age");
        assert!(Patient::register(input("Ravi", -4)).is_err());
    }

    #[test]
    fn rejects_malformed_email() {
        let err = Patient::register(NewPatient {
            email: Some("not-an-email".to_string()),
            ..input("Ravi", 40)
        })
        .unwrap_err();
        assert_eq!(err.field(), "email");
    }
}
