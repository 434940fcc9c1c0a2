//! Queue domain - tokens, their status lifecycle, and the events they emit.

mod errors;
mod events;
mod status;
mod token;
mod transitions;

pub use errors::{QueueError, Resource};
pub use events::{QueueEvent, QueueEventKind};
pub use status::TokenStatus;
pub use token::{IssueDay, SequenceKey, Token, TokenNumber};
pub use transitions::TokenStateMachine;
