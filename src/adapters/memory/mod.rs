//! In-memory adapters.
//!
//! Used when no database is configured and throughout the tests. State lives
//! for the lifetime of the process only.

mod clinic_directory;
mod token_repository;
mod token_sequencer;

pub use clinic_directory::InMemoryClinicDirectory;
pub use token_repository::InMemoryTokenRepository;
pub use token_sequencer::InMemoryTokenSequencer;
