//! Subscriber connection over any sink of websocket messages.
//!
//! The outbound half of a split `WebSocket` is wrapped here; the inbound
//! half stays with the handler that reads (and ignores) client frames.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{Sink, SinkExt};
use tokio::sync::Mutex;

use crate::ports::{ConnectionId, DeliveryError, SubscriberConnection};

/// Outbound half of a live websocket.
pub type WebSocketConnection = SinkConnection<SplitSink<WebSocket, Message>>;

/// A subscriber backed by a message sink.
pub struct SinkConnection<S> {
    id: ConnectionId,
    sink: Mutex<S>,
}

impl<S> SinkConnection<S> {
    pub fn new(sink: S) -> Self {
        Self {
            id: ConnectionId::new(),
            sink: Mutex::new(sink),
        }
    }
}

#[async_trait]
impl<S> SubscriberConnection for SinkConnection<S>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: std::fmt::Display,
{
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send_text(&self, text: &str) -> Result<(), DeliveryError> {
        self.sink
            .lock()
            .await
            .send(Message::Text(text.to_string()))
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }

    async fn close(&self) {
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.send(Message::Close(None)).await {
            tracing::trace!(connection_id = %self.id, error = %e, "Close frame not sent");
        }
        let _ = sink.close().await;
    }
}
