//! `GET /health` - liveness probe.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::application::QueueService;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Live websocket subscribers
    pub subscribers: usize,
}

async fn health(State(queue): State<Arc<QueueService>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        subscribers: queue.subscriber_count().await,
    })
}

pub fn health_router(queue: Arc<QueueService>) -> Router {
    Router::new().route("/health", get(health)).with_state(queue)
}
