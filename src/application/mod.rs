//! Application layer - orchestration of domain operations over ports.

pub mod queue;

pub use queue::{CreateTokenCommand, QueueService, QueueServicePorts, UpdateTokenStatusCommand};
