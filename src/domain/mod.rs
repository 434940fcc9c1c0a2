//! Domain layer containing business rules and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, roles, errors, state machine trait)
//! - `clinic` - Doctors and patients the queue refers to
//! - `queue` - Tokens, the status lifecycle, and queue events

pub mod clinic;
pub mod foundation;
pub mod queue;
