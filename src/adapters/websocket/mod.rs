//! WebSocket adapters for the real-time queue feed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       QueueService                            │
//! │   create_token / update_status → publish(QueueEvent)          │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       BroadcastHub                            │
//! │   registry of SubscriberConnection, per-connection send lock  │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!          ┌────────────────────┼────────────────────┐
//!          ▼                    ▼                    ▼
//!   WebSocketConnection  WebSocketConnection  WebSocketConnection
//!   (waiting room)       (front desk)         (doctor)
//! ```
//!
//! # Components
//!
//! - [`hub`] - Live subscriber registry and fan-out
//! - [`connection`] - `SubscriberConnection` over a websocket sink
//! - [`handler`] - Axum upgrade handler for `GET /ws/tokens`

pub mod connection;
pub mod handler;
pub mod hub;

pub use connection::{SinkConnection, WebSocketConnection};
pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use hub::{BroadcastHub, HubConfig};
