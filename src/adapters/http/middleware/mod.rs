//! HTTP middleware for axum.
//!
//! - `auth` - Bearer token validation and the `RequireActor` extractor

pub mod auth;

pub use auth::{auth_middleware, AuthRejection, AuthState, RequireActor};
