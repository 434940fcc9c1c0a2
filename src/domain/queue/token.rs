//! Token aggregate.
//!
//! A token is one patient's slot in one doctor's queue for one calendar day.
//! Everything except `status` is fixed at creation; `status` only moves
//! through [`super::TokenStateMachine`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DoctorId, OwnedByDoctor, PatientId, Timestamp, TokenId, ValidationError,
};

use super::TokenStatus;

/// Calendar day (UTC) a token was issued on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueDay(NaiveDate);

impl IssueDay {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Issue day of a creation timestamp.
    pub fn of(created_at: &Timestamp) -> Self {
        Self(created_at.date())
    }

    pub fn today() -> Self {
        Self::of(&Timestamp::now())
    }

    pub fn as_date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for IssueDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scope of a sequence: one doctor on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceKey {
    pub doctor_id: DoctorId,
    pub day: IssueDay,
}

impl SequenceKey {
    pub fn new(doctor_id: DoctorId, day: IssueDay) -> Self {
        Self { doctor_id, day }
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.doctor_id, self.day)
    }
}

/// Positive per-(doctor, day) ordinal of a token.
///
/// Stored and sent over the wire as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenNumber(u32);

impl TokenNumber {
    pub const FIRST: TokenNumber = TokenNumber(1);

    /// Creates a token number, rejecting zero.
    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if value == 0 {
            return Err(ValidationError::out_of_range(
                "token_number",
                1,
                u32::MAX as i64,
                0,
            ));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// The number issued after this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TokenNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s.trim().parse().map_err(|_| {
            ValidationError::invalid_format("token_number", format!("'{}' is not a number", s))
        })?;
        Self::new(value)
    }
}

impl Serialize for TokenNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TokenNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Token aggregate.
///
/// # Invariants
///
/// - `number` is unique within `(doctor_id, issue_day)`
/// - `completed` is terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    id: TokenId,
    number: TokenNumber,
    doctor_id: DoctorId,
    patient_id: PatientId,
    status: TokenStatus,
    created_at: Timestamp,
}

impl Token {
    /// Issues a fresh token in `waiting`.
    pub fn issue(
        number: TokenNumber,
        doctor_id: DoctorId,
        patient_id: PatientId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: TokenId::new(),
            number,
            doctor_id,
            patient_id,
            status: TokenStatus::Waiting,
            created_at,
        }
    }

    /// Reconstitute a token from persistence (no validation).
    pub fn reconstitute(
        id: TokenId,
        number: TokenNumber,
        doctor_id: DoctorId,
        patient_id: PatientId,
        status: TokenStatus,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            number,
            doctor_id,
            patient_id,
            status,
            created_at,
        }
    }

    pub fn id(&self) -> &TokenId {
        &self.id
    }

    pub fn number(&self) -> TokenNumber {
        self.number
    }

    pub fn doctor_id(&self) -> &DoctorId {
        &self.doctor_id
    }

    pub fn patient_id(&self) -> &PatientId {
        &self.patient_id
    }

    pub fn status(&self) -> TokenStatus {
        self.status
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Day the token belongs to, fixed by `created_at`.
    pub fn issue_day(&self) -> IssueDay {
        IssueDay::of(&self.created_at)
    }

    pub fn sequence_key(&self) -> SequenceKey {
        SequenceKey::new(self.doctor_id, self.issue_day())
    }

    pub(super) fn set_status(&mut self, status: TokenStatus) {
        self.status = status;
    }
}

impl OwnedByDoctor for Token {
    fn owning_doctor(&self) -> &DoctorId {
        &self.doctor_id
    }
}
