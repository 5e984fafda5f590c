//! Query parameters for the persistence gateway.
//!
//! A [`Query`] is a plain value: table, equality filters, optional ordering,
//! optional limit. Both backends interpret it identically, including `NULL`:
//! a filter on [`Value::Null`] matches rows where the column is null.

use chrono::{DateTime, Utc};

use super::RepositoryError;

/// Tables managed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Shop credentials (one row per shop domain).
    Shops,
    /// Saved wishlist entries.
    WishlistItems,
    /// Legacy OAuth session snapshots.
    ShopifySessions,
}

impl Table {
    /// SQL table name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Shops => "shops",
            Self::WishlistItems => "wishlist_items",
            Self::ShopifySessions => "shopify_sessions",
        }
    }

    /// Columns that may appear in filters and ordering.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Shops => &[
                "id",
                "shop_domain",
                "access_token",
                "is_active",
                "created_at",
                "updated_at",
            ],
            Self::WishlistItems => &[
                "id",
                "shop_domain",
                "customer_id",
                "session_id",
                "product_id",
                "variant_id",
                "product_title",
                "product_price",
                "product_image_url",
                "created_at",
            ],
            Self::ShopifySessions => &[
                "id",
                "shop",
                "state",
                "is_online",
                "scope",
                "access_token",
                "expires_at",
                "user_id",
                "user_token",
                "created_at",
                "updated_at",
            ],
        }
    }

    /// Column used to detect conflicts on upsert.
    #[must_use]
    pub const fn conflict_column(self) -> Option<&'static str> {
        match self {
            Self::Shops => Some("shop_domain"),
            Self::ShopifySessions => Some("id"),
            Self::WishlistItems => None,
        }
    }

    fn check_column(self, column: &str) -> Result<(), RepositoryError> {
        if self.columns().contains(&column) {
            Ok(())
        } else {
            Err(RepositoryError::UnknownColumn {
                table: self.name(),
                column: column.to_owned(),
            })
        }
    }
}

/// A scalar column value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Column equality filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: &'static str,
    pub value: Value,
}

impl Filter {
    /// `column = value` (or `column IS NULL` for [`Value::Null`]).
    #[must_use]
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Result ordering. Ties are broken by `id` in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub direction: Direction,
}

/// A filtered read (or delete) against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    /// Unfiltered, unordered query over a table.
    #[must_use]
    pub const fn all(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Check that every referenced column exists on the table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::UnknownColumn` for the first unknown column.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        for filter in &self.filters {
            self.table.check_column(filter.column)?;
        }
        if let Some(order) = &self.order {
            self.table.check_column(order.column)?;
        }
        Ok(())
    }
}
