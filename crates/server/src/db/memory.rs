//! In-process persistence gateway.
//!
//! Used when no database is configured. Data lives for the lifetime of the
//! process. Ids are assigned from a per-table counter starting at 1, so
//! insertion order and id order coincide.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::RwLock;

use moonbox_core::{Owner, ShopId, WishlistItemId};

use super::{
    Direction, NewRecord, PersistenceGateway, Query, Record, RepositoryError, Table, Value,
    ensure_filtered,
};
use crate::models::{
    NewShopCredential, NewWishlistItem, OAuthSession, ProductSnapshot, ShopCredential,
    WishlistItem,
};

/// Shop seeded for local development.
pub const DEMO_SHOP: &str = "demo.myshopify.com";
/// Anonymous session owning the seeded wishlist item.
pub const DEMO_SESSION: &str = "demo_session";
const DEMO_TOKEN: &str = "demo_token";

#[derive(Default)]
struct Tables {
    rows: HashMap<Table, BTreeMap<i32, Record>>,
    last_seq: HashMap<Table, i32>,
}

impl Tables {
    fn rows(&self, table: Table) -> impl Iterator<Item = (&i32, &Record)> {
        self.rows.get(&table).into_iter().flat_map(BTreeMap::iter)
    }

    fn find(&self, table: Table, column: &str, value: &Value) -> Option<(i32, Record)> {
        self.rows(table)
            .find(|(_, record)| record.column(column).as_ref() == Some(value))
            .map(|(seq, record)| (*seq, record.clone()))
    }

    fn next_seq(&mut self, table: Table) -> Result<i32, RepositoryError> {
        let last = self.last_seq.entry(table).or_insert(0);
        *last = last.checked_add(1).ok_or_else(|| {
            RepositoryError::Conflict(format!("{} id space exhausted", table.name()))
        })?;
        Ok(*last)
    }

    fn put(&mut self, table: Table, seq: i32, record: Record) {
        self.rows.entry(table).or_default().insert(seq, record);
    }

    fn insert(&mut self, record: NewRecord, now: DateTime<Utc>) -> Result<Record, RepositoryError> {
        let table = record.table();
        if let Some((column, key)) = conflict_key(&record)
            && self.find(table, column, &key).is_some()
        {
            return Err(RepositoryError::Conflict(format!(
                "duplicate {column} on {}",
                table.name()
            )));
        }

        let seq = self.next_seq(table)?;
        let stored = materialize(record, seq, now, now);
        self.put(table, seq, stored.clone());
        Ok(stored)
    }
}

fn conflict_key(record: &NewRecord) -> Option<(&'static str, Value)> {
    match record {
        NewRecord::Shop(shop) => Some(("shop_domain", Value::from(shop.shop_domain.as_str()))),
        NewRecord::Session(session) => Some(("id", Value::from(session.id.as_str()))),
        NewRecord::WishlistItem(_) => None,
    }
}

/// Build the stored form of a new record.
fn materialize(
    record: NewRecord,
    seq: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Record {
    match record {
        NewRecord::Shop(shop) => Record::Shop(ShopCredential {
            id: ShopId::new(seq),
            shop_domain: shop.shop_domain,
            access_token: shop.access_token,
            is_active: shop.is_active,
            created_at,
            updated_at,
        }),
        NewRecord::WishlistItem(item) => Record::WishlistItem(WishlistItem {
            id: WishlistItemId::new(seq),
            shop_domain: item.shop_domain,
            owner: item.owner,
            product_id: item.product_id,
            variant_id: item.variant_id,
            product: item.product,
            created_at,
        }),
        NewRecord::Session(session) => Record::Session(OAuthSession {
            id: session.id,
            shop: session.shop,
            state: session.state,
            is_online: session.is_online,
            scope: session.scope,
            access_token: session.access_token,
            expires_at: session.expires_at,
            user_id: session.user_id,
            user_token: session.user_token,
            created_at,
            updated_at,
        }),
    }
}

fn created_at(record: &Record) -> DateTime<Utc> {
    match record {
        Record::Shop(shop) => shop.created_at,
        Record::WishlistItem(item) => item.created_at,
        Record::Session(session) => session.created_at,
    }
}

fn matches(record: &Record, query: &Query) -> bool {
    query
        .filters
        .iter()
        .all(|filter| record.column(filter.column).as_ref() == Some(&filter.value))
}

/// Persistence gateway backed by in-process tables.
#[derive(Default)]
pub struct MemoryGateway {
    tables: RwLock<Tables>,
}

impl MemoryGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the demo shop and one anonymous-session item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a write fails.
    pub async fn seed_demo(&self) -> Result<(), RepositoryError> {
        self.upsert(NewRecord::Shop(NewShopCredential::active(
            DEMO_SHOP,
            SecretString::from(DEMO_TOKEN),
        )))
        .await?;

        self.insert(NewRecord::WishlistItem(NewWishlistItem {
            shop_domain: DEMO_SHOP.to_owned(),
            owner: Owner::Session(DEMO_SESSION.to_owned()),
            product_id: "12345".to_owned(),
            variant_id: Some("67890".to_owned()),
            product: ProductSnapshot {
                title: Some("Demo Product".to_owned()),
                price: Some("$99.90".to_owned()),
                image_url: Some("https://via.placeholder.com/150".to_owned()),
            },
        }))
        .await?;

        tracing::info!(shop = DEMO_SHOP, "Seeded demo data");
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn query(&self, query: &Query) -> Result<Vec<Record>, RepositoryError> {
        query.validate()?;
        let tables = self.tables.read().await;

        let mut rows: Vec<(i32, Record)> = tables
            .rows(query.table)
            .filter(|(_, record)| matches(record, query))
            .map(|(seq, record)| (*seq, record.clone()))
            .collect();

        if let Some(order) = query.order {
            rows.sort_by(|(seq_a, a), (seq_b, b)| {
                a.column(order.column)
                    .cmp(&b.column(order.column))
                    .then(seq_a.cmp(seq_b))
            });
            if order.direction == Direction::Descending {
                rows.reverse();
            }
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows.into_iter().take(limit).map(|(_, record)| record).collect())
    }

    async fn insert(&self, record: NewRecord) -> Result<Record, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.insert(record, Utc::now())
    }

    async fn upsert(&self, record: NewRecord) -> Result<Record, RepositoryError> {
        let table = record.table();
        let Some((column, key)) = conflict_key(&record) else {
            return Err(RepositoryError::Unsupported(format!(
                "upsert on {}",
                table.name()
            )));
        };

        let now = Utc::now();
        let mut tables = self.tables.write().await;

        match tables.find(table, column, &key) {
            Some((seq, existing)) => {
                let stored = materialize(record, seq, created_at(&existing), now);
                tables.put(table, seq, stored.clone());
                Ok(stored)
            }
            None => tables.insert(record, now),
        }
    }

    async fn delete(&self, query: &Query) -> Result<u64, RepositoryError> {
        query.validate()?;
        ensure_filtered(query)?;

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.rows.get_mut(&query.table) else {
            return Ok(0);
        };

        let before = rows.len();
        rows.retain(|_, record| !matches(record, query));
        Ok(u64::try_from(before - rows.len()).unwrap_or(u64::MAX))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{Filter, Order};
    use crate::models::NewOAuthSession;

    fn item(shop: &str, owner: Owner, product: &str) -> NewRecord {
        NewRecord::WishlistItem(NewWishlistItem {
            shop_domain: shop.to_string(),
            owner,
            product_id: product.to_string(),
            variant_id: None,
            product: ProductSnapshot::default(),
        })
    }

    fn ids(records: &[Record]) -> Vec<Value> {
        records.iter().map(|r| r.column("id").unwrap()).collect()
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let gateway = MemoryGateway::new();
        let a = gateway
            .insert(item("a.myshopify.com", Owner::Session("s".into()), "1"))
            .await
            .unwrap();
        let b = gateway
            .insert(item("a.myshopify.com", Owner::Session("s".into()), "2"))
            .await
            .unwrap();
        assert_eq!(a.column("id"), Some(Value::Int(1)));
        assert_eq!(b.column("id"), Some(Value::Int(2)));
    }

    #[tokio::test]
    async fn test_null_filter_matches_null_column() {
        let gateway = MemoryGateway::new();
        gateway
            .insert(item("a.myshopify.com", Owner::Session("s".into()), "1"))
            .await
            .unwrap();
        gateway
            .insert(item("a.myshopify.com", Owner::Customer("c".into()), "1"))
            .await
            .unwrap();

        let query = Query {
            filters: vec![
                Filter::eq("customer_id", None::<&str>),
                Filter::eq("session_id", "s"),
            ],
            ..Query::all(Table::WishlistItems)
        };
        let rows = gateway.query(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].column("session_id"), Some(Value::from("s")));
    }

    #[tokio::test]
    async fn test_descending_order_breaks_ties_by_id() {
        let gateway = MemoryGateway::new();
        for product in ["1", "2", "3"] {
            gateway
                .insert(item("a.myshopify.com", Owner::Session("s".into()), product))
                .await
                .unwrap();
        }

        let query = Query {
            order: Some(Order {
                column: "shop_domain",
                direction: Direction::Descending,
            }),
            ..Query::all(Table::WishlistItems)
        };
        let rows = gateway.query(&query).await.unwrap();
        assert_eq!(ids(&rows), vec![Value::Int(3), Value::Int(2), Value::Int(1)]);
    }

    #[tokio::test]
    async fn test_limit_applies_after_ordering() {
        let gateway = MemoryGateway::new();
        for product in ["1", "2", "3"] {
            gateway
                .insert(item("a.myshopify.com", Owner::Session("s".into()), product))
                .await
                .unwrap();
        }
        let query = Query {
            order: Some(Order {
                column: "id",
                direction: Direction::Descending,
            }),
            limit: Some(1),
            ..Query::all(Table::WishlistItems)
        };
        let rows = gateway.query(&query).await.unwrap();
        assert_eq!(ids(&rows), vec![Value::Int(3)]);
    }

    #[tokio::test]
    async fn test_shop_upsert_keeps_id_and_created_at() {
        let gateway = MemoryGateway::new();
        let first = gateway
            .upsert(NewRecord::Shop(NewShopCredential::active(
                "a.myshopify.com",
                SecretString::from("one"),
            )))
            .await
            .unwrap();
        let second = gateway
            .upsert(NewRecord::Shop(NewShopCredential::revoked("a.myshopify.com")))
            .await
            .unwrap();

        assert_eq!(first.column("id"), second.column("id"));
        assert_eq!(first.column("created_at"), second.column("created_at"));
        assert_eq!(second.column("access_token"), Some(Value::Null));
        assert_eq!(second.column("is_active"), Some(Value::Bool(false)));

        let all = gateway.query(&Query::all(Table::Shops)).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_shop_insert_conflicts() {
        let gateway = MemoryGateway::new();
        let shop = || {
            NewRecord::Shop(NewShopCredential::active(
                "a.myshopify.com",
                SecretString::from("t"),
            ))
        };
        gateway.insert(shop()).await.unwrap();
        assert!(matches!(
            gateway.insert(shop()).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_rejected_for_wishlist_items() {
        let gateway = MemoryGateway::new();
        let result = gateway
            .upsert(item("a.myshopify.com", Owner::Session("s".into()), "1"))
            .await;
        assert!(matches!(result, Err(RepositoryError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_session_upsert_by_id_and_delete_by_shop() {
        let gateway = MemoryGateway::new();
        let session = NewOAuthSession::offline("a.myshopify.com", SecretString::from("t"), None);
        gateway
            .upsert(NewRecord::Session(session.clone()))
            .await
            .unwrap();
        gateway.upsert(NewRecord::Session(session)).await.unwrap();

        let removed = gateway
            .delete(&Query {
                filters: vec![Filter::eq("shop", "a.myshopify.com")],
                ..Query::all(Table::ShopifySessions)
            })
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_unfiltered_delete_rejected() {
        let gateway = MemoryGateway::new();
        let result = gateway.delete(&Query::all(Table::WishlistItems)).await;
        assert!(matches!(result, Err(RepositoryError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_seed_demo() {
        let gateway = MemoryGateway::new();
        gateway.seed_demo().await.unwrap();

        let items = gateway
            .query(&Query {
                filters: vec![Filter::eq("session_id", DEMO_SESSION)],
                ..Query::all(Table::WishlistItems)
            })
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].column("product_id"), Some(Value::from("12345")));
    }
}
