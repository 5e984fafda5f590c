//! Domain models for the wishlist backend.
//!
//! These are validated domain objects, separate from database row types.
//! Storage representations live in [`crate::db`].

pub mod oauth_session;
pub mod session;
pub mod shop;
pub mod wishlist;

pub use oauth_session::{NewOAuthSession, OAuthSession};
pub use session::keys as session_keys;
pub use shop::{NewShopCredential, ShopCredential};
pub use wishlist::{NewWishlistItem, ProductSnapshot, WishlistItem};
