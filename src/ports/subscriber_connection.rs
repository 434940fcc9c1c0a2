//! Subscriber connection port.
//!
//! A live channel to one real-time viewer. Transports (websocket, test
//! doubles) implement this; the broadcast hub only sees the trait.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque handle of a registered subscriber connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a single frame could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("connection closed")]
    Closed,

    #[error("send timed out")]
    TimedOut,

    #[error("transport error: {0}")]
    Transport(String),
}

/// One live subscriber.
///
/// `send_text` may be called from several tasks; the hub serializes calls
/// per connection, so implementations need not order concurrent frames.
#[async_trait]
pub trait SubscriberConnection: Send + Sync {
    fn id(&self) -> ConnectionId;

    /// Write one text frame.
    async fn send_text(&self, text: &str) -> Result<(), DeliveryError>;

    /// Close the underlying transport. Must not fail.
    async fn close(&self);
}
