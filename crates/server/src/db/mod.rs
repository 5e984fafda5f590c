//! Persistence for the wishlist backend.
//!
//! Everything goes through the [`PersistenceGateway`] trait, which has two
//! implementations with identical observable semantics:
//!
//! - [`PostgresGateway`] - production storage
//! - [`MemoryGateway`] - in-process tables for local development and tests
//!
//! # Tables
//!
//! - `shops` - installation credentials, unique by `shop_domain`
//! - `wishlist_items` - saved products, owned by a customer or a session
//! - `shopify_sessions` - OAuth session snapshots, keyed by `id`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p moonbox-cli -- migrate
//! ```
//!
//! Handlers should not talk to the gateway directly; use the typed
//! repositories ([`ShopRepository`], [`WishlistRepository`],
//! [`SessionRepository`]).

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::models::{
    NewOAuthSession, NewShopCredential, NewWishlistItem, OAuthSession, ShopCredential,
    WishlistItem,
};

pub mod memory;
pub mod postgres;
pub mod query;
pub mod sessions;
pub mod shops;
pub mod wishlist;

pub use memory::MemoryGateway;
pub use postgres::PostgresGateway;
pub use query::{Direction, Filter, Order, Query, Table, Value};
pub use sessions::SessionRepository;
pub use shops::ShopRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in storage is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate shop domain).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A query referenced a column the table does not have.
    #[error("unknown column {column} on {table}")]
    UnknownColumn {
        table: &'static str,
        column: String,
    },

    /// The operation is not supported for this table or query.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// A stored row from any table.
#[derive(Debug, Clone)]
pub enum Record {
    Shop(ShopCredential),
    WishlistItem(WishlistItem),
    Session(OAuthSession),
}

impl Record {
    /// Table this record belongs to.
    #[must_use]
    pub const fn table(&self) -> Table {
        match self {
            Self::Shop(_) => Table::Shops,
            Self::WishlistItem(_) => Table::WishlistItems,
            Self::Session(_) => Table::ShopifySessions,
        }
    }

    /// Column value by name, `None` if the column does not exist.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Value> {
        match self {
            Self::Shop(shop) => shop_column(shop, name),
            Self::WishlistItem(item) => item_column(item, name),
            Self::Session(session) => session_column(session, name),
        }
    }
}

fn secret_value(secret: Option<&secrecy::SecretString>) -> Value {
    Value::from(secret.map(|s| s.expose_secret().to_owned()))
}

fn shop_column(shop: &ShopCredential, name: &str) -> Option<Value> {
    let value = match name {
        "id" => Value::from(shop.id.as_i32()),
        "shop_domain" => Value::from(shop.shop_domain.as_str()),
        "access_token" => secret_value(shop.access_token.as_ref()),
        "is_active" => Value::from(shop.is_active),
        "created_at" => Value::from(shop.created_at),
        "updated_at" => Value::from(shop.updated_at),
        _ => return None,
    };
    Some(value)
}

fn item_column(item: &WishlistItem, name: &str) -> Option<Value> {
    let value = match name {
        "id" => Value::from(item.id.as_i32()),
        "shop_domain" => Value::from(item.shop_domain.as_str()),
        "customer_id" => Value::from(item.owner.customer_id()),
        "session_id" => Value::from(item.owner.session_id()),
        "product_id" => Value::from(item.product_id.as_str()),
        "variant_id" => Value::from(item.variant_id.as_deref()),
        "product_title" => Value::from(item.product.title.as_deref()),
        "product_price" => Value::from(item.product.price.as_deref()),
        "product_image_url" => Value::from(item.product.image_url.as_deref()),
        "created_at" => Value::from(item.created_at),
        _ => return None,
    };
    Some(value)
}

fn session_column(session: &OAuthSession, name: &str) -> Option<Value> {
    let value = match name {
        "id" => Value::from(session.id.as_str()),
        "shop" => Value::from(session.shop.as_str()),
        "state" => Value::from(session.state.as_deref()),
        "is_online" => Value::from(session.is_online),
        "scope" => Value::from(session.scope.as_deref()),
        "access_token" => secret_value(session.access_token.as_ref()),
        "expires_at" => Value::from(session.expires_at),
        "user_id" => Value::from(session.user_id),
        "user_token" => Value::from(session.user_token.as_deref()),
        "created_at" => Value::from(session.created_at),
        "updated_at" => Value::from(session.updated_at),
        _ => return None,
    };
    Some(value)
}

/// A row to be written; storage assigns ids and timestamps.
#[derive(Debug, Clone)]
pub enum NewRecord {
    Shop(NewShopCredential),
    WishlistItem(NewWishlistItem),
    Session(NewOAuthSession),
}

impl NewRecord {
    #[must_use]
    pub const fn table(&self) -> Table {
        match self {
            Self::Shop(_) => Table::Shops,
            Self::WishlistItem(_) => Table::WishlistItems,
            Self::Session(_) => Table::ShopifySessions,
        }
    }
}

/// Uniform storage operations over the three tables.
///
/// Implementations must agree on:
///
/// - equality filters, where [`Value::Null`] matches null columns
/// - ordering, with ties broken by insertion order (`id`) in the same direction
/// - upsert conflict keys (`shops.shop_domain`, `shopify_sessions.id`)
///
/// Check-then-insert sequences built on top of this trait are not atomic.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Short backend name for logs and readiness output.
    fn backend(&self) -> &'static str;

    /// Rows matching all filters.
    async fn query(&self, query: &Query) -> Result<Vec<Record>, RepositoryError>;

    /// Insert a new row and return it as stored.
    async fn insert(&self, record: NewRecord) -> Result<Record, RepositoryError>;

    /// Insert, or update the row with the same conflict key.
    async fn upsert(&self, record: NewRecord) -> Result<Record, RepositoryError>;

    /// Delete rows matching all filters. Returns the number removed.
    ///
    /// An unfiltered delete is rejected.
    async fn delete(&self, query: &Query) -> Result<u64, RepositoryError>;

    /// Check that storage is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Reject deletes that would empty a table.
pub(crate) fn ensure_filtered(query: &Query) -> Result<(), RepositoryError> {
    if query.filters.is_empty() {
        return Err(RepositoryError::Unsupported(format!(
            "unfiltered delete on {}",
            query.table.name()
        )));
    }
    Ok(())
}
