//! Shop installation lifecycle.
//!
//! ```text
//! Unknown --(callback / direct install)--> Active
//! Active  --(uninstall webhook)---------> Revoked (token cleared, row kept)
//! Revoked --(callback / direct install)--> Active
//! ```
//!
//! Wishlist items are not touched by any transition.

use secrecy::SecretString;
use tracing::instrument;

use crate::db::{PersistenceGateway, RepositoryError, SessionRepository, ShopRepository};
use crate::models::{NewOAuthSession, ShopCredential};

/// What an uninstall changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uninstalled {
    /// Whether a credential row existed and was revoked.
    pub revoked: bool,
    /// Number of legacy OAuth sessions deleted.
    pub sessions_removed: u64,
}

/// Installation service.
pub struct InstallService<'a> {
    shops: ShopRepository<'a>,
    sessions: SessionRepository<'a>,
}

impl<'a> InstallService<'a> {
    #[must_use]
    pub const fn new(gateway: &'a dyn PersistenceGateway) -> Self {
        Self {
            shops: ShopRepository::new(gateway),
            sessions: SessionRepository::new(gateway),
        }
    }

    /// Persist the result of a completed OAuth exchange.
    ///
    /// Upserts the shop credential, then the offline session snapshot.
    /// Replaying the same callback converges on the same rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if either write fails.
    #[instrument(skip(self, access_token, scope))]
    pub async fn complete_oauth(
        &self,
        shop_domain: &str,
        access_token: SecretString,
        scope: Option<String>,
    ) -> Result<ShopCredential, RepositoryError> {
        let shop = self.shops.install(shop_domain, access_token.clone()).await?;
        self.sessions
            .store(NewOAuthSession::offline(shop_domain, access_token, scope))
            .await?;

        tracing::info!("Shop installed via OAuth");
        Ok(shop)
    }

    /// Install a shop with a token obtained out of band.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    #[instrument(skip(self, access_token))]
    pub async fn install_direct(
        &self,
        shop_domain: &str,
        access_token: SecretString,
    ) -> Result<ShopCredential, RepositoryError> {
        let shop = self.shops.install(shop_domain, access_token).await?;
        tracing::info!("Shop installed directly");
        Ok(shop)
    }

    /// Revoke a shop's credential and drop its legacy sessions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a write fails.
    #[instrument(skip(self))]
    pub async fn uninstall(&self, shop_domain: &str) -> Result<Uninstalled, RepositoryError> {
        let revoked = self.shops.revoke(shop_domain).await?;
        let sessions_removed = self.sessions.delete_by_shop(shop_domain).await?;

        tracing::info!(revoked, sessions_removed, "Shop uninstalled");
        Ok(Uninstalled {
            revoked,
            sessions_removed,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use moonbox_core::Owner;

    use super::*;
    use crate::db::{MemoryGateway, WishlistRepository};
    use crate::models::{NewWishlistItem, ProductSnapshot};

    const SHOP: &str = "a.myshopify.com";

    #[tokio::test]
    async fn test_complete_oauth_is_idempotent() {
        let gateway = MemoryGateway::new();
        let service = InstallService::new(&gateway);

        let first = service
            .complete_oauth(SHOP, SecretString::from("t1"), Some("read_products".into()))
            .await
            .unwrap();
        let second = service
            .complete_oauth(SHOP, SecretString::from("t1"), Some("read_products".into()))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let sessions = SessionRepository::new(&gateway).find_by_shop(SHOP).await.unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_uninstall_revokes_and_keeps_wishlist() {
        let gateway = MemoryGateway::new();
        let service = InstallService::new(&gateway);
        service
            .complete_oauth(SHOP, SecretString::from("t1"), None)
            .await
            .unwrap();
        WishlistRepository::new(&gateway)
            .create(NewWishlistItem {
                shop_domain: SHOP.to_string(),
                owner: Owner::Session("s".to_string()),
                product_id: "1".to_string(),
                variant_id: None,
                product: ProductSnapshot::default(),
            })
            .await
            .unwrap();

        let result = service.uninstall(SHOP).await.unwrap();
        assert_eq!(
            result,
            Uninstalled {
                revoked: true,
                sessions_removed: 1
            }
        );

        let shops = ShopRepository::new(&gateway);
        assert!(shops.find_authorized(SHOP).await.unwrap().is_none());
        assert!(shops.get(SHOP).await.unwrap().is_some());

        let items = WishlistRepository::new(&gateway)
            .list(SHOP, &Owner::Session("s".to_string()))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_uninstall_unknown_shop_is_noop() {
        let gateway = MemoryGateway::new();
        let result = InstallService::new(&gateway).uninstall(SHOP).await.unwrap();
        assert!(!result.revoked);
        assert_eq!(result.sessions_removed, 0);
    }
}
