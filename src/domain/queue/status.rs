//! TokenStatus enum and its transition table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle status of a queue token.
///
/// `in_progress` was added after the first release; adding further states
/// means extending this enum and the table in `valid_transitions` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    #[default]
    Waiting,
    InProgress,
    Completed,
}

impl TokenStatus {
    pub const ALL: [TokenStatus; 3] = [
        TokenStatus::Waiting,
        TokenStatus::InProgress,
        TokenStatus::Completed,
    ];

    /// Wire and storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Waiting => "waiting",
            TokenStatus::InProgress => "in_progress",
            TokenStatus::Completed => "completed",
        }
    }

    /// Returns true while the patient is still in the queue.
    pub fn is_open(&self) -> bool {
        !matches!(self, TokenStatus::Completed)
    }
}

impl StateMachine for TokenStatus {
    fn valid_transitions(&self) -> &'static [Self] {
        use TokenStatus::*;
        match self {
            // waiting -> completed is an accepted shortcut (patient seen without
            // the doctor first marking the token in progress)
            Waiting => &[InProgress, Completed],
            InProgress => &[Completed],
            Completed => &[],
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(TokenStatus::Waiting),
            "in_progress" => Ok(TokenStatus::InProgress),
            "completed" => Ok(TokenStatus::Completed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown token status '{}'", other),
            )),
        }
    }
}
