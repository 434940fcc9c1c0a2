//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the queue core and the outside world. Adapters implement these ports.
//!
//! ## Persistence
//!
//! - `TokenRepository` - Issued tokens
//! - `ClinicDirectory` - Doctors, patients, users and their roles
//! - `TokenSequencer` - Race-free per-(doctor, day) numbering
//!
//! ## Real-time
//!
//! - `SubscriberConnection` - One live viewer
//! - `QueueEventPublisher` / `SubscriberRegistry` - Fan-out to all viewers
//!
//! ## Auth
//!
//! - `SessionValidator` - Access token to `Actor`

mod clinic_directory;
mod event_publisher;
mod session_validator;
mod subscriber_connection;
mod token_repository;
mod token_sequencer;

pub use clinic_directory::ClinicDirectory;
pub use event_publisher::{PublishReport, QueueEventPublisher, SubscriberRegistry};
pub use session_validator::SessionValidator;
pub use subscriber_connection::{ConnectionId, DeliveryError, SubscriberConnection};
pub use token_repository::TokenRepository;
pub use token_sequencer::{ensure_matches, SequenceReservation, TokenSequencer};
