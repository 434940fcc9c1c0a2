//! Queue use cases: issuing tokens, advancing them, and the read models
//! the front desk, doctors and the waiting-room board need.

mod commands;
mod service;

pub use commands::{CreateTokenCommand, UpdateTokenStatusCommand};
pub use service::{QueueService, QueueServicePorts};
