//! Core types for Moonbox.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod owner;
pub mod shop_domain;

pub use id::*;
pub use owner::{Owner, OwnerKind};
pub use shop_domain::{ShopDomain, ShopDomainError};
