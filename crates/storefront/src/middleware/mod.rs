//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! [`Identity`] is an extractor rather than a layer: it reads the session the
//! session layer put in the request extensions. [`Payload`] is the JSON body
//! extractor every handler uses.

pub mod identity;
pub mod payload;
pub mod session;

pub use identity::Identity;
pub use payload::Payload;
pub use session::{SESSION_COOKIE_NAME, create_postgres_session_layer, create_session_layer};
