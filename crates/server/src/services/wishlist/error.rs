//! Wishlist service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during wishlist operations.
#[derive(Debug, Error)]
pub enum WishlistError {
    /// Required input fields are absent.
    #[error("missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// Neither a customer id nor a session id was supplied.
    #[error("missing owner: provide customer_id or a session id")]
    MissingOwner,

    /// Item does not exist.
    #[error("wishlist item not found")]
    NotFound,

    /// Item belongs to a different shop.
    #[error("wishlist item belongs to another shop")]
    Forbidden,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
