//! HTTP adapters - REST API implementations.
//!
//! - `queue` - patients, doctors and tokens under `/patients`
//! - `health` - liveness probe
//! - `middleware` - bearer token authentication
//!
//! [`app_router`] assembles these with the websocket feed into the served
//! application.

pub mod health;
pub mod middleware;
pub mod queue;

pub use health::health_router;
pub use queue::{queue_routes, QueueHandlers};

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::adapters::websocket::{websocket_router, WebSocketState};
use crate::application::QueueService;
use crate::ports::SessionValidator;

use self::middleware::auth_middleware;

/// Cross-cutting settings for the assembled router.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Origins allowed by CORS; empty means same-origin only
    pub cors_origins: Vec<String>,
    /// Bound on a single request; `None` disables the timeout layer
    pub request_timeout: Option<Duration>,
}

/// Builds the full application router.
///
/// ```text
/// /health            public
/// /ws/tokens         public, live events
/// /patients/...      bearer auth (public board excepted)
/// ```
pub fn app_router(
    queue: Arc<QueueService>,
    sessions: Arc<dyn SessionValidator>,
    options: &RouterOptions,
) -> Router {
    let api = Router::new()
        .nest("/patients", queue_routes(QueueHandlers::new(queue.clone())))
        .layer(from_fn_with_state(sessions, auth_middleware));

    let app = Router::new()
        .merge(health_router(queue.clone()))
        .merge(websocket_router(WebSocketState::new(queue)))
        .merge(api);

    let app = match options.request_timeout {
        Some(timeout) => app.layer(TimeoutLayer::new(timeout)),
        None => app,
    };

    let origins: Vec<HeaderValue> = options
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let app = if origins.is_empty() {
        app
    } else {
        tracing::info!(origins = ?origins, "CORS origins configured");
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
    };

    app.layer(TraceLayer::new_for_http())
}
