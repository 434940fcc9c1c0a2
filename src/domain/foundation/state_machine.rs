//! State machine trait for status enums.
//!
//! Each implementor declares its transition table once, in
//! `valid_transitions`; legality checks and terminal detection derive from it.

use std::fmt;

use thiserror::Error;

/// A rejected move between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot transition from {from} to {to}")]
pub struct TransitionRejected<S: fmt::Display + fmt::Debug> {
    pub from: S,
    pub to: S,
}

/// Trait for status enums that represent state machines.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for TokenStatus {
///     fn valid_transitions(&self) -> &'static [Self] {
///         match self {
///             Waiting => &[InProgress, Completed],
///             InProgress => &[Completed],
///             Completed => &[],
///         }
///     }
/// }
///
/// let next = current.transition_to(TokenStatus::Completed)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + fmt::Debug + fmt::Display + 'static {
    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> &'static [Self];

    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, TransitionRejected<Self>> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(TransitionRejected {
                from: *self,
                to: target,
            })
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestStatus {
        Draft,
        Active,
        Archived,
    }

    impl fmt::Display for TestStatus {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl StateMachine for TestStatus {
        fn valid_transitions(&self) -> &'static [Self] {
            use TestStatus::*;
            match self {
                Draft => &[Active],
                Active => &[Archived],
                Archived => &[],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_transition() {
        assert_eq!(
            TestStatus::Draft.transition_to(TestStatus::Active),
            Ok(TestStatus::Active)
        );
    }

    #[test]
    fn transition_to_reports_both_ends_on_rejection() {
        let err = TestStatus::Draft
            .transition_to(TestStatus::Archived)
            .unwrap_err();
        assert_eq!(err.from, TestStatus::Draft);
        assert_eq!(err.to, TestStatus::Archived);
        assert_eq!(err.to_string(), "cannot transition from Draft to Archived");
    }

    #[test]
    fn is_terminal_follows_table() {
        assert!(TestStatus::Archived.is_terminal());
        assert!(!TestStatus::Draft.is_terminal());
    }
}
