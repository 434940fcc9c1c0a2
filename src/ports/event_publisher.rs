//! Queue event publishing ports.
//!
//! `QueueEventPublisher` is what the queue service calls after a successful
//! write; `SubscriberRegistry` is how transports add and remove live
//! viewers. Both are implemented by the broadcast hub.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::queue::QueueEvent;

use super::{ConnectionId, SubscriberConnection};

/// Outcome of one publish call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Connections that received the event.
    pub delivered: usize,
    /// Connections that failed and were unregistered.
    pub failed: usize,
}

/// Port for fanning queue events out to live subscribers.
///
/// Delivery is best-effort and at-most-once per registered connection.
/// Per-connection failures are handled inside the publisher and show up only
/// in the returned report.
#[async_trait]
pub trait QueueEventPublisher: Send + Sync {
    /// Deliver `event` to every connection registered when the call starts.
    ///
    /// # Errors
    ///
    /// - `InternalError` if the event could not be encoded (nothing is sent)
    async fn publish(&self, event: &QueueEvent) -> Result<PublishReport, DomainError>;
}

/// Port for managing the live subscriber set.
#[async_trait]
pub trait SubscriberRegistry: Send + Sync {
    /// Add a connection. Registering an id that is already present is a no-op.
    async fn register(&self, connection: Arc<dyn SubscriberConnection>);

    /// Remove a connection. Unknown ids are ignored.
    async fn unregister(&self, id: ConnectionId);

    /// Number of live connections.
    async fn subscriber_count(&self) -> usize;
}
