//! Authentication adapters implementing the `SessionValidator` port.
//!
//! - `jwt` - HS256 access tokens, roles from the clinic directory
//! - `mock` - Fixed token table for tests and local development

mod jwt;
mod mock;

pub use jwt::{AccessClaims, JwtSessionValidator};
pub use mock::MockSessionValidator;
