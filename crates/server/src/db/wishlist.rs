//! Wishlist item repository.

use moonbox_core::{Owner, WishlistItemId};

use super::{
    Direction, Filter, NewRecord, Order, PersistenceGateway, Query, Record, RepositoryError,
    Table,
};
use crate::models::{NewWishlistItem, WishlistItem};

fn into_item(record: Record) -> Result<WishlistItem, RepositoryError> {
    match record {
        Record::WishlistItem(item) => Ok(item),
        other => Err(RepositoryError::DataCorruption(format!(
            "expected wishlist item record, got {}",
            other.table().name()
        ))),
    }
}

fn into_items(records: Vec<Record>) -> Result<Vec<WishlistItem>, RepositoryError> {
    records.into_iter().map(into_item).collect()
}

/// Owner columns: the populated one must match, the other must be null.
fn owner_filters(owner: &Owner) -> [Filter; 2] {
    [
        Filter::eq("customer_id", owner.customer_id()),
        Filter::eq("session_id", owner.session_id()),
    ]
}

fn by_id(id: WishlistItemId) -> Query {
    Query {
        filters: vec![Filter::eq("id", id.as_i32())],
        limit: Some(1),
        ..Query::all(Table::WishlistItems)
    }
}

/// Repository for wishlist items.
pub struct WishlistRepository<'a> {
    gateway: &'a dyn PersistenceGateway,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(gateway: &'a dyn PersistenceGateway) -> Self {
        Self { gateway }
    }

    /// Find an existing item for the same shop, owner, product and variant.
    ///
    /// A `None` variant only matches items saved without a variant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn find_duplicate(
        &self,
        shop_domain: &str,
        owner: &Owner,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        let mut filters = vec![Filter::eq("shop_domain", shop_domain)];
        filters.extend(owner_filters(owner));
        filters.push(Filter::eq("product_id", product_id));
        filters.push(Filter::eq("variant_id", variant_id));

        let query = Query {
            filters,
            limit: Some(1),
            ..Query::all(Table::WishlistItems)
        };
        self.gateway
            .query(&query)
            .await?
            .into_iter()
            .next()
            .map(into_item)
            .transpose()
    }

    /// Store a new item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the insert fails.
    pub async fn create(&self, item: NewWishlistItem) -> Result<WishlistItem, RepositoryError> {
        let record = self.gateway.insert(NewRecord::WishlistItem(item)).await?;
        into_item(record)
    }

    /// Get an item by id, in any shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get(&self, id: WishlistItemId) -> Result<Option<WishlistItem>, RepositoryError> {
        self.gateway
            .query(&by_id(id))
            .await?
            .into_iter()
            .next()
            .map(into_item)
            .transpose()
    }

    /// Delete an item by id. Returns `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the delete fails.
    pub async fn delete(&self, id: WishlistItemId) -> Result<bool, RepositoryError> {
        let removed = self.gateway.delete(&by_id(id)).await?;
        Ok(removed > 0)
    }

    /// All items for an owner in a shop, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list(
        &self,
        shop_domain: &str,
        owner: &Owner,
    ) -> Result<Vec<WishlistItem>, RepositoryError> {
        let mut filters = vec![Filter::eq("shop_domain", shop_domain)];
        filters.extend(owner_filters(owner));

        let query = Query {
            filters,
            order: Some(Order {
                column: "created_at",
                direction: Direction::Descending,
            }),
            ..Query::all(Table::WishlistItems)
        };
        into_items(self.gateway.query(&query).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryGateway;
    use crate::models::ProductSnapshot;

    fn new_item(owner: Owner, product: &str, variant: Option<&str>) -> NewWishlistItem {
        NewWishlistItem {
            shop_domain: "a.myshopify.com".to_string(),
            owner,
            product_id: product.to_string(),
            variant_id: variant.map(str::to_string),
            product: ProductSnapshot::default(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_distinguishes_missing_variant() {
        let gateway = MemoryGateway::new();
        let repo = WishlistRepository::new(&gateway);
        let owner = Owner::Session("s".to_string());

        repo.create(new_item(owner.clone(), "1", None)).await.unwrap();

        let dup = repo
            .find_duplicate("a.myshopify.com", &owner, "1", None)
            .await
            .unwrap();
        assert!(dup.is_some());

        let other_variant = repo
            .find_duplicate("a.myshopify.com", &owner, "1", Some("v1"))
            .await
            .unwrap();
        assert!(other_variant.is_none());
    }

    #[tokio::test]
    async fn test_list_is_partitioned_by_owner() {
        let gateway = MemoryGateway::new();
        let repo = WishlistRepository::new(&gateway);
        let customer = Owner::Customer("42".to_string());
        let session = Owner::Session("42".to_string());

        repo.create(new_item(customer.clone(), "1", None)).await.unwrap();
        repo.create(new_item(session.clone(), "2", None)).await.unwrap();

        let items = repo.list("a.myshopify.com", &customer).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "1");

        let other_shop = repo.list("b.myshopify.com", &customer).await.unwrap();
        assert!(other_shop.is_empty());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let gateway = MemoryGateway::new();
        let repo = WishlistRepository::new(&gateway);
        let owner = Owner::Session("s".to_string());

        for product in ["1", "2", "3"] {
            repo.create(new_item(owner.clone(), product, None)).await.unwrap();
        }

        let products: Vec<String> = repo
            .list("a.myshopify.com", &owner)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.product_id)
            .collect();
        assert_eq!(products, vec!["3", "2", "1"]);
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let gateway = MemoryGateway::new();
        let repo = WishlistRepository::new(&gateway);
        let item = repo
            .create(new_item(Owner::Session("s".to_string()), "1", None))
            .await
            .unwrap();

        assert_eq!(repo.get(item.id).await.unwrap(), Some(item.clone()));
        assert!(repo.delete(item.id).await.unwrap());
        assert!(!repo.delete(item.id).await.unwrap());
        assert!(repo.get(item.id).await.unwrap().is_none());
    }
}
