//! `PostgreSQL` persistence gateway.
//!
//! Queries are assembled at runtime with [`QueryBuilder`]. Column names are
//! checked against each table's whitelist before they reach SQL; values are
//! always bound.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use moonbox_core::{Owner, ShopId, WishlistItemId};

use super::{
    Direction, Filter, NewRecord, PersistenceGateway, Query, Record, RepositoryError, Table, Value,
    ensure_filtered,
};
use crate::models::{
    NewOAuthSession, NewShopCredential, NewWishlistItem, OAuthSession, ProductSnapshot,
    ShopCredential, WishlistItem,
};

const SHOP_COLUMNS: &str = "id, shop_domain, access_token, is_active, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, shop_domain, customer_id, session_id, product_id, variant_id, \
     product_title, product_price, product_image_url, created_at";

const SESSION_COLUMNS: &str = "id, shop, state, is_online, scope, access_token, expires_at, \
     user_id, user_token, created_at, updated_at";

const fn select_columns(table: Table) -> &'static str {
    match table {
        Table::Shops => SHOP_COLUMNS,
        Table::WishlistItems => ITEM_COLUMNS,
        Table::ShopifySessions => SESSION_COLUMNS,
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(FromRow)]
struct ShopRow {
    id: ShopId,
    shop_domain: String,
    access_token: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ShopRow> for ShopCredential {
    fn from(row: ShopRow) -> Self {
        Self {
            id: row.id,
            shop_domain: row.shop_domain,
            access_token: row.access_token.map(SecretString::from),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct WishlistItemRow {
    id: WishlistItemId,
    shop_domain: String,
    customer_id: Option<String>,
    session_id: Option<String>,
    product_id: String,
    variant_id: Option<String>,
    product_title: Option<String>,
    product_price: Option<String>,
    product_image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<WishlistItemRow> for WishlistItem {
    type Error = RepositoryError;

    fn try_from(row: WishlistItemRow) -> Result<Self, Self::Error> {
        let owner = Owner::from_columns(row.customer_id, row.session_id).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "wishlist item {} must have exactly one owner column",
                row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            shop_domain: row.shop_domain,
            owner,
            product_id: row.product_id,
            variant_id: row.variant_id,
            product: ProductSnapshot {
                title: row.product_title,
                price: row.product_price,
                image_url: row.product_image_url,
            },
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct SessionRow {
    id: String,
    shop: String,
    state: Option<String>,
    is_online: bool,
    scope: Option<String>,
    access_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    user_id: Option<i64>,
    user_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SessionRow> for OAuthSession {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            shop: row.shop,
            state: row.state,
            is_online: row.is_online,
            scope: row.scope,
            access_token: row.access_token.map(SecretString::from),
            expires_at: row.expires_at,
            user_id: row.user_id,
            user_token: row.user_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn expose(secret: Option<&SecretString>) -> Option<String> {
    secret.map(|s| s.expose_secret().to_owned())
}

// =============================================================================
// SQL assembly
// =============================================================================

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: Value) {
    match value {
        Value::Null => builder.push("NULL"),
        Value::Bool(v) => builder.push_bind(v),
        Value::Int(v) => builder.push_bind(v),
        Value::Text(v) => builder.push_bind(v),
        Value::Timestamp(v) => builder.push_bind(v),
    };
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) {
    for (index, filter) in filters.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        builder.push(filter.column);
        if filter.value == Value::Null {
            builder.push(" IS NULL");
        } else {
            builder.push(" = ");
            push_value(builder, filter.value.clone());
        }
    }
}

/// Build a `SELECT` for a validated query.
///
/// `NULL` sorts lowest, matching the in-memory backend's value ordering.
fn select_sql(query: &Query) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {} FROM {}",
        select_columns(query.table),
        query.table.name()
    ));

    push_filters(&mut builder, &query.filters);

    if let Some(order) = query.order {
        let direction = order.direction.as_sql();
        let nulls = match order.direction {
            Direction::Ascending => "NULLS FIRST",
            Direction::Descending => "NULLS LAST",
        };
        builder.push(format!(
            " ORDER BY {} {direction} {nulls}, id {direction}",
            order.column
        ));
    }

    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    builder
}

fn map_write_error(error: sqlx::Error, table: Table) -> RepositoryError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(format!("duplicate key on {}", table.name()))
        }
        _ => RepositoryError::Database(error),
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Persistence gateway backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PostgresGateway {
    pool: PgPool,
}

impl PostgresGateway {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn write_shop(
        &self,
        shop: NewShopCredential,
        upsert: bool,
    ) -> Result<Record, RepositoryError> {
        let sql = if upsert {
            format!(
                "INSERT INTO shops (shop_domain, access_token, is_active) VALUES ($1, $2, $3) \
                 ON CONFLICT (shop_domain) DO UPDATE SET \
                 access_token = EXCLUDED.access_token, \
                 is_active = EXCLUDED.is_active, \
                 updated_at = now() \
                 RETURNING {SHOP_COLUMNS}"
            )
        } else {
            format!(
                "INSERT INTO shops (shop_domain, access_token, is_active) VALUES ($1, $2, $3) \
                 RETURNING {SHOP_COLUMNS}"
            )
        };

        let row = sqlx::query_as::<_, ShopRow>(&sql)
            .bind(&shop.shop_domain)
            .bind(expose(shop.access_token.as_ref()))
            .bind(shop.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, Table::Shops))?;

        Ok(Record::Shop(row.into()))
    }

    async fn insert_item(&self, item: NewWishlistItem) -> Result<Record, RepositoryError> {
        let sql = format!(
            "INSERT INTO wishlist_items \
             (shop_domain, customer_id, session_id, product_id, variant_id, \
              product_title, product_price, product_image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ITEM_COLUMNS}"
        );

        let row = sqlx::query_as::<_, WishlistItemRow>(&sql)
            .bind(&item.shop_domain)
            .bind(item.owner.customer_id())
            .bind(item.owner.session_id())
            .bind(&item.product_id)
            .bind(item.variant_id.as_deref())
            .bind(item.product.title.as_deref())
            .bind(item.product.price.as_deref())
            .bind(item.product.image_url.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, Table::WishlistItems))?;

        Ok(Record::WishlistItem(row.try_into()?))
    }

    async fn write_session(
        &self,
        session: NewOAuthSession,
        upsert: bool,
    ) -> Result<Record, RepositoryError> {
        let conflict = if upsert {
            "ON CONFLICT (id) DO UPDATE SET \
             shop = EXCLUDED.shop, \
             state = EXCLUDED.state, \
             is_online = EXCLUDED.is_online, \
             scope = EXCLUDED.scope, \
             access_token = EXCLUDED.access_token, \
             expires_at = EXCLUDED.expires_at, \
             user_id = EXCLUDED.user_id, \
             user_token = EXCLUDED.user_token, \
             updated_at = now() "
        } else {
            ""
        };
        let sql = format!(
            "INSERT INTO shopify_sessions \
             (id, shop, state, is_online, scope, access_token, expires_at, user_id, user_token) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             {conflict}RETURNING {SESSION_COLUMNS}"
        );

        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(&session.id)
            .bind(&session.shop)
            .bind(session.state.as_deref())
            .bind(session.is_online)
            .bind(session.scope.as_deref())
            .bind(expose(session.access_token.as_ref()))
            .bind(session.expires_at)
            .bind(session.user_id)
            .bind(session.user_token.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, Table::ShopifySessions))?;

        Ok(Record::Session(row.into()))
    }
}

#[async_trait]
impl PersistenceGateway for PostgresGateway {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn query(&self, query: &Query) -> Result<Vec<Record>, RepositoryError> {
        query.validate()?;
        let mut builder = select_sql(query);

        match query.table {
            Table::Shops => {
                let rows = builder
                    .build_query_as::<ShopRow>()
                    .fetch_all(&self.pool)
                    .await?;
                Ok(rows.into_iter().map(|r| Record::Shop(r.into())).collect())
            }
            Table::WishlistItems => {
                let rows = builder
                    .build_query_as::<WishlistItemRow>()
                    .fetch_all(&self.pool)
                    .await?;
                rows.into_iter()
                    .map(|r| WishlistItem::try_from(r).map(Record::WishlistItem))
                    .collect()
            }
            Table::ShopifySessions => {
                let rows = builder
                    .build_query_as::<SessionRow>()
                    .fetch_all(&self.pool)
                    .await?;
                Ok(rows.into_iter().map(|r| Record::Session(r.into())).collect())
            }
        }
    }

    async fn insert(&self, record: NewRecord) -> Result<Record, RepositoryError> {
        match record {
            NewRecord::Shop(shop) => self.write_shop(shop, false).await,
            NewRecord::WishlistItem(item) => self.insert_item(item).await,
            NewRecord::Session(session) => self.write_session(session, false).await,
        }
    }

    async fn upsert(&self, record: NewRecord) -> Result<Record, RepositoryError> {
        match record {
            NewRecord::Shop(shop) => self.write_shop(shop, true).await,
            NewRecord::Session(session) => self.write_session(session, true).await,
            NewRecord::WishlistItem(_) => Err(RepositoryError::Unsupported(format!(
                "upsert on {}",
                Table::WishlistItems.name()
            ))),
        }
    }

    async fn delete(&self, query: &Query) -> Result<u64, RepositoryError> {
        query.validate()?;
        ensure_filtered(query)?;

        let mut builder =
            QueryBuilder::<Postgres>::new(format!("DELETE FROM {}", query.table.name()));
        push_filters(&mut builder, &query.filters);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
