//! CLI subcommands.

pub mod inventory;
pub mod migrate;
pub mod seed;
pub mod status;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use storehouse_storefront::db;

/// Errors shared by the database-backed commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read `STOREFRONT_DATABASE_URL` (falling back to `DATABASE_URL`).
pub fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

/// Connect to the storefront database.
pub async fn connect() -> Result<PgPool, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&url).await?)
}
