//! Wishlist service.
//!
//! Owner resolution and deduplication sit here, above the repository.

mod error;

pub use error::WishlistError;

use tracing::instrument;

use moonbox_core::{Owner, WishlistItemId};

use super::owner::{SessionSources, resolve_owner};
use crate::db::{PersistenceGateway, WishlistRepository};
use crate::models::{NewWishlistItem, ProductSnapshot, WishlistItem};

/// Input for [`WishlistService::add`].
#[derive(Debug, Clone, Default)]
pub struct AddItem {
    pub product_id: Option<String>,
    pub shop_domain: Option<String>,
    pub variant_id: Option<String>,
    pub customer_id: Option<String>,
    pub product: ProductSnapshot,
}

/// Result of adding an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new row was stored.
    Created(WishlistItem),
    /// The same tuple already exists; nothing was written.
    Duplicate(WishlistItemId),
}

/// Treat empty and whitespace-only strings as absent.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Wishlist service.
pub struct WishlistService<'a> {
    items: WishlistRepository<'a>,
}

impl<'a> WishlistService<'a> {
    /// Create a new wishlist service.
    #[must_use]
    pub const fn new(gateway: &'a dyn PersistenceGateway) -> Self {
        Self {
            items: WishlistRepository::new(gateway),
        }
    }

    /// Save a product for the resolved owner, unless already saved.
    ///
    /// Performs one read and at most one write. The check and the insert are
    /// separate operations.
    ///
    /// # Errors
    ///
    /// Returns `WishlistError::MissingFields` if `product_id` or `shop_domain` is absent.
    /// Returns `WishlistError::MissingOwner` if no owner can be resolved.
    /// Returns `WishlistError::Repository` if storage fails.
    #[instrument(skip(self, input, sessions), fields(shop = ?input.shop_domain))]
    pub async fn add(
        &self,
        input: AddItem,
        sessions: &SessionSources,
    ) -> Result<AddOutcome, WishlistError> {
        let product_id = present(input.product_id.as_deref());
        let shop_domain = present(input.shop_domain.as_deref());

        let mut missing = Vec::new();
        if product_id.is_none() {
            missing.push("product_id");
        }
        if shop_domain.is_none() {
            missing.push("shop_domain");
        }
        let (Some(product_id), Some(shop_domain)) = (product_id, shop_domain) else {
            return Err(WishlistError::MissingFields(missing));
        };

        let owner = resolve_owner(input.customer_id.as_deref(), sessions)
            .ok_or(WishlistError::MissingOwner)?;
        let variant_id = present(input.variant_id.as_deref());

        if let Some(existing) = self
            .items
            .find_duplicate(shop_domain, &owner, product_id, variant_id)
            .await?
        {
            tracing::debug!(item_id = %existing.id, "Wishlist item already saved");
            return Ok(AddOutcome::Duplicate(existing.id));
        }

        let item = self
            .items
            .create(NewWishlistItem {
                shop_domain: shop_domain.to_owned(),
                owner,
                product_id: product_id.to_owned(),
                variant_id: variant_id.map(str::to_owned),
                product: input.product,
            })
            .await?;

        tracing::info!(item_id = %item.id, "Wishlist item created");
        Ok(AddOutcome::Created(item))
    }

    /// Delete an item, refusing items that belong to another shop.
    ///
    /// `item_id` is the raw path segment; anything non-numeric is not found.
    ///
    /// # Errors
    ///
    /// Returns `WishlistError::NotFound` if the item does not exist.
    /// Returns `WishlistError::Forbidden` if `auth_shop` differs from the item's shop.
    /// Returns `WishlistError::Repository` if storage fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, item_id: &str, auth_shop: Option<&str>) -> Result<(), WishlistError> {
        let id: WishlistItemId = item_id.parse().map_err(|_| WishlistError::NotFound)?;
        let item = self.items.get(id).await?.ok_or(WishlistError::NotFound)?;

        if let Some(shop) = auth_shop
            && shop != item.shop_domain
        {
            tracing::warn!(item_shop = %item.shop_domain, "Cross-shop wishlist delete refused");
            return Err(WishlistError::Forbidden);
        }

        if !self.items.delete(id).await? {
            return Err(WishlistError::NotFound);
        }
        Ok(())
    }

    /// All items for the resolved owner in a shop, newest first.
    ///
    /// # Errors
    ///
    /// Returns `WishlistError::MissingFields` if `shop_domain` is absent.
    /// Returns `WishlistError::MissingOwner` if no owner can be resolved.
    /// Returns `WishlistError::Repository` if storage fails.
    #[instrument(skip(self, sessions))]
    pub async fn list(
        &self,
        shop_domain: Option<&str>,
        customer_id: Option<&str>,
        sessions: &SessionSources,
    ) -> Result<Vec<WishlistItem>, WishlistError> {
        let shop_domain =
            present(shop_domain).ok_or_else(|| WishlistError::MissingFields(vec!["shop_domain"]))?;
        let owner: Owner =
            resolve_owner(customer_id, sessions).ok_or(WishlistError::MissingOwner)?;

        Ok(self.items.list(shop_domain, &owner).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryGateway;

    fn session(id: &str) -> SessionSources {
        SessionSources {
            header: Some(id.to_string()),
            ..SessionSources::default()
        }
    }

    fn add_input(product: &str, variant: Option<&str>) -> AddItem {
        AddItem {
            product_id: Some(product.to_string()),
            shop_domain: Some("a.myshopify.com".to_string()),
            variant_id: variant.map(str::to_string),
            ..AddItem::default()
        }
    }

    #[tokio::test]
    async fn test_add_twice_is_duplicate_with_same_id() {
        let gateway = MemoryGateway::new();
        let service = WishlistService::new(&gateway);

        let first = service.add(add_input("123", None), &session("S1")).await.unwrap();
        let AddOutcome::Created(item) = first else {
            panic!("expected created, got {first:?}");
        };

        let second = service.add(add_input("123", None), &session("S1")).await.unwrap();
        assert_eq!(second, AddOutcome::Duplicate(item.id));
    }

    #[tokio::test]
    async fn test_empty_variant_is_no_variant() {
        let gateway = MemoryGateway::new();
        let service = WishlistService::new(&gateway);

        service.add(add_input("123", None), &session("S1")).await.unwrap();
        let again = service.add(add_input("123", Some("")), &session("S1")).await.unwrap();
        assert!(matches!(again, AddOutcome::Duplicate(_)));

        let variant = service.add(add_input("123", Some("9")), &session("S1")).await.unwrap();
        assert!(matches!(variant, AddOutcome::Created(_)));
    }

    #[tokio::test]
    async fn test_add_reports_all_missing_fields() {
        let gateway = MemoryGateway::new();
        let service = WishlistService::new(&gateway);

        let err = service
            .add(AddItem::default(), &session("S1"))
            .await
            .unwrap_err();
        match err {
            WishlistError::MissingFields(fields) => {
                assert_eq!(fields, vec!["product_id", "shop_domain"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_add_without_owner() {
        let gateway = MemoryGateway::new();
        let service = WishlistService::new(&gateway);
        let err = service
            .add(add_input("1", None), &SessionSources::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WishlistError::MissingOwner));
    }

    #[tokio::test]
    async fn test_customer_and_session_do_not_collide() {
        let gateway = MemoryGateway::new();
        let service = WishlistService::new(&gateway);

        let as_customer = AddItem {
            customer_id: Some("S1".to_string()),
            ..add_input("1", None)
        };
        service.add(as_customer, &SessionSources::default()).await.unwrap();
        let as_session = service.add(add_input("1", None), &session("S1")).await.unwrap();
        assert!(matches!(as_session, AddOutcome::Created(_)));
    }

    #[tokio::test]
    async fn test_remove_cross_shop_is_forbidden() {
        let gateway = MemoryGateway::new();
        let service = WishlistService::new(&gateway);
        let AddOutcome::Created(item) = service
            .add(add_input("1", None), &session("S1"))
            .await
            .unwrap()
        else {
            panic!("expected created");
        };

        let err = service
            .remove(&item.id.to_string(), Some("b.myshopify.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, WishlistError::Forbidden));

        let items = service
            .list(Some("a.myshopify.com"), None, &session("S1"))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);

        service
            .remove(&item.id.to_string(), Some("a.myshopify.com"))
            .await
            .unwrap();
        let items = service
            .list(Some("a.myshopify.com"), None, &session("S1"))
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_or_malformed_id() {
        let gateway = MemoryGateway::new();
        let service = WishlistService::new(&gateway);
        assert!(matches!(
            service.remove("999", None).await,
            Err(WishlistError::NotFound)
        ));
        assert!(matches!(
            service.remove("mock_1", None).await,
            Err(WishlistError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_requires_shop_and_owner() {
        let gateway = MemoryGateway::new();
        let service = WishlistService::new(&gateway);

        assert!(matches!(
            service.list(None, None, &session("S1")).await,
            Err(WishlistError::MissingFields(_))
        ));
        assert!(matches!(
            service
                .list(Some("a.myshopify.com"), None, &SessionSources::default())
                .await,
            Err(WishlistError::MissingOwner)
        ));
        assert!(
            service
                .list(Some("a.myshopify.com"), None, &session("nobody"))
                .await
                .unwrap()
                .is_empty()
        );
    }
}
