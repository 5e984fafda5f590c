//! Moonbox Core - Shared domain types.
//!
//! This crate provides the types shared between the wishlist server and the
//! command-line tools:
//! - `server` - HTTP backend (wishlist API, OAuth, webhooks)
//! - `cli` - Migrations and direct shop management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. Storage-specific encodings live behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, validated shop domains, and wishlist owners

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
