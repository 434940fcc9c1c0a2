//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the queue core to external systems:
//! - `memory` - In-process storage and sequencing (default, tests)
//! - `postgres` - PostgreSQL storage and row-locked sequencing
//! - `websocket` - Live subscriber hub and the `/ws/tokens` transport
//! - `auth` - Access token validation
//! - `http` - REST API and router assembly

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod websocket;
