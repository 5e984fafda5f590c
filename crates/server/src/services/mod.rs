//! Business logic services.
//!
//! # Services
//!
//! - `owner` - Resolve the wishlist owner from request context
//! - `wishlist` - Add (with dedup), remove and list wishlist items
//! - `install` - Shop installation lifecycle (install, uninstall)

pub mod install;
pub mod owner;
pub mod wishlist;

pub use install::{InstallService, Uninstalled};
pub use owner::{SESSION_COOKIE, SESSION_HEADER, SessionSources, resolve_owner};
pub use wishlist::{AddItem, AddOutcome, WishlistError, WishlistService};
