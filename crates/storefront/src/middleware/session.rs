//! Session middleware configuration.
//!
//! Production sessions live in `PostgreSQL` (`tower_sessions.session`); tests
//! pass tower-sessions' in-memory store. The cookie's inactivity expiry is
//! also the lifetime of an anonymous owner's active-cart association.

use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "sh_session";

/// Session expiry time in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer over any session store.
#[must_use]
pub fn create_session_layer<Store: SessionStore + Clone>(
    store: Store,
    config: &StorefrontConfig,
) -> SessionManagerLayer<Store> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Create the session layer with the `PostgreSQL` store.
///
/// The sessions table must be created via migration.
#[must_use]
pub fn create_postgres_session_layer(
    pool: &sqlx::PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    create_session_layer(PostgresStore::new(pool.clone()), config)
}
