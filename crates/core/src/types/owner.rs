//! Wishlist owner identity.
//!
//! A wishlist item belongs to exactly one owner: either a logged-in customer
//! or an anonymous storefront session. Storage flattens this into two
//! mutually exclusive nullable columns (`customer_id`, `session_id`); the
//! domain layer never sees that representation.

use serde::{Deserialize, Serialize};

/// Which kind of identity an [`Owner`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    /// Authenticated storefront customer.
    Customer,
    /// Anonymous browser session.
    Session,
}

/// The identity a wishlist item is partitioned by (within a shop).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Owner {
    /// A platform customer ID.
    Customer(String),
    /// An anonymous session ID issued by the embed script.
    Session(String),
}

impl Owner {
    /// Rebuild an owner from its two storage columns.
    ///
    /// Returns `None` unless exactly one column is populated.
    #[must_use]
    pub fn from_columns(customer_id: Option<String>, session_id: Option<String>) -> Option<Self> {
        match (customer_id, session_id) {
            (Some(customer), None) => Some(Self::Customer(customer)),
            (None, Some(session)) => Some(Self::Session(session)),
            _ => None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> OwnerKind {
        match self {
            Self::Customer(_) => OwnerKind::Customer,
            Self::Session(_) => OwnerKind::Session,
        }
    }

    /// The raw identifier, regardless of kind.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Customer(id) | Self::Session(id) => id,
        }
    }

    /// Value for the `customer_id` column.
    #[must_use]
    pub fn customer_id(&self) -> Option<&str> {
        match self {
            Self::Customer(id) => Some(id),
            Self::Session(_) => None,
        }
    }

    /// Value for the `session_id` column.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Session(id) => Some(id),
            Self::Customer(_) => None,
        }
    }
}
