//! WebSocket upgrade handler for the live token feed.
//!
//! Connection lifecycle:
//! 1. Upgrade to WebSocket
//! 2. Register the outbound half with the queue service's hub
//! 3. Read inbound frames until close or error (text is ignored)
//! 4. Unregister

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::StreamExt;

use crate::application::QueueService;
use crate::ports::SubscriberConnection;

use super::WebSocketConnection;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub queue: Arc<QueueService>,
}

impl WebSocketState {
    pub fn new(queue: Arc<QueueService>) -> Self {
        Self { queue }
    }
}

/// `GET /ws/tokens` - subscribe to queue events.
///
/// Open to any client; events carry nothing beyond what the public board shows
/// plus the patient's name.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.queue))
}

async fn handle_socket(socket: WebSocket, queue: Arc<QueueService>) {
    let (sink, mut stream) = socket.split();
    let connection = Arc::new(WebSocketConnection::new(sink));
    let connection_id = connection.id();

    queue.register_subscriber(connection).await;
    tracing::debug!(connection_id = %connection_id, "Subscriber connected");

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(_)) => {
                tracing::trace!(connection_id = %connection_id, "Ignoring client text frame");
            }
            Ok(Message::Binary(_)) => {
                tracing::debug!(connection_id = %connection_id, "Ignoring binary frame");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // keepalive, answered by axum
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                break;
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "Receive error");
                break;
            }
        }
    }

    queue.unregister_subscriber(connection_id).await;
    tracing::debug!(connection_id = %connection_id, "Subscriber disconnected");
}

/// Router for the websocket endpoint.
pub fn websocket_router(state: WebSocketState) -> Router {
    Router::new()
        .route("/ws/tokens", get(ws_handler))
        .with_state(state)
}
