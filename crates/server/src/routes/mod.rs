//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                         - Service banner
//! GET    /health                   - Liveness check
//! GET    /health/ready             - Readiness check (pings storage)
//!
//! # Wishlist API (shop auth gate)
//! POST   /api/wishlist             - Add item (deduplicated)
//! GET    /api/wishlist             - List the owner's items
//! DELETE /api/wishlist/{item_id}   - Remove item
//!
//! # OAuth
//! GET    /auth                     - Redirect to Shopify authorization
//! GET    /auth/callback            - Complete authorization
//!
//! # Webhooks (HMAC signed)
//! POST   /webhooks/app_uninstalled - Revoke shop credential
//!
//! # Manual install
//! GET    /install                  - Install form
//! POST   /install                  - Install with a pasted token
//! ```

pub mod auth;
pub mod health;
pub mod install;
pub mod webhooks;
pub mod wishlist;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Create the wishlist API router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::list).post(wishlist::add))
        .route("/{item_id}", delete(wishlist::remove))
}

/// Create the OAuth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::begin))
        .route("/callback", get(auth::callback))
}

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::index))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/wishlist", wishlist_routes())
        .nest("/auth", auth_routes())
        .route("/webhooks/app_uninstalled", post(webhooks::app_uninstalled))
        .route("/install", get(install::form).post(install::install))
}
