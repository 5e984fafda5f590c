//! Shop credential management.
//!
//! # Usage
//!
//! ```bash
//! # Install a shop with an Admin API token from a custom app
//! mb-cli shop install --shop my-store.myshopify.com --token shpat_...
//!
//! # Revoke a shop (same effect as the uninstall webhook)
//! mb-cli shop revoke --shop my-store.myshopify.com
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use moonbox_core::{ShopDomain, ShopDomainError};
use moonbox_server::db::{PostgresGateway, RepositoryError};
use moonbox_server::services::InstallService;
use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur during shop operations.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Shop domain failed validation.
    #[error("Invalid shop domain: {0}")]
    InvalidShop(#[from] ShopDomainError),

    /// Access token is blank.
    #[error("Access token cannot be empty")]
    EmptyToken,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

async fn connect() -> Result<PostgresGateway, ShopError> {
    let database_url = super::database_url().ok_or(ShopError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;
    Ok(PostgresGateway::new(pool))
}

/// Install (or reinstall) a shop with an access token.
///
/// # Errors
///
/// Returns `ShopError` if the input is invalid or the write fails.
pub async fn install(shop: &str, token: &str) -> Result<(), ShopError> {
    let shop = ShopDomain::parse(shop)?;
    let token = token.trim();
    if token.is_empty() {
        return Err(ShopError::EmptyToken);
    }

    let gateway = connect().await?;
    let credential = InstallService::new(&gateway)
        .install_direct(shop.as_str(), SecretString::from(token.to_owned()))
        .await?;

    tracing::info!(
        "Shop installed! ID: {}, Domain: {}",
        credential.id,
        credential.shop_domain
    );
    Ok(())
}

/// Revoke a shop's credential and remove its OAuth sessions.
///
/// # Errors
///
/// Returns `ShopError` if the domain is invalid or a write fails.
pub async fn revoke(shop: &str) -> Result<(), ShopError> {
    let shop = ShopDomain::parse(shop)?;

    let gateway = connect().await?;
    let result = InstallService::new(&gateway).uninstall(shop.as_str()).await?;

    if result.revoked {
        tracing::info!(
            "Shop revoked: {} ({} session(s) removed)",
            shop,
            result.sessions_removed
        );
    } else {
        tracing::warn!("No credential found for {}", shop);
    }
    Ok(())
}
