//! Shop credential repository.

use secrecy::SecretString;

use super::{Filter, NewRecord, PersistenceGateway, Query, Record, RepositoryError, Table};
use crate::models::{NewShopCredential, ShopCredential};

fn into_shop(record: Record) -> Result<ShopCredential, RepositoryError> {
    match record {
        Record::Shop(shop) => Ok(shop),
        other => Err(RepositoryError::DataCorruption(format!(
            "expected shop record, got {}",
            other.table().name()
        ))),
    }
}

/// Repository for shop installations.
pub struct ShopRepository<'a> {
    gateway: &'a dyn PersistenceGateway,
}

impl<'a> ShopRepository<'a> {
    /// Create a new shop repository.
    #[must_use]
    pub const fn new(gateway: &'a dyn PersistenceGateway) -> Self {
        Self { gateway }
    }

    /// Get the credential row for a shop, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get(&self, shop_domain: &str) -> Result<Option<ShopCredential>, RepositoryError> {
        let query = Query {
            filters: vec![Filter::eq("shop_domain", shop_domain)],
            limit: Some(1),
            ..Query::all(Table::Shops)
        };
        self.gateway
            .query(&query)
            .await?
            .into_iter()
            .next()
            .map(into_shop)
            .transpose()
    }

    /// Get the credential for a shop only if it is active and holds a token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn find_authorized(
        &self,
        shop_domain: &str,
    ) -> Result<Option<ShopCredential>, RepositoryError> {
        let query = Query {
            filters: vec![
                Filter::eq("shop_domain", shop_domain),
                Filter::eq("is_active", true),
            ],
            limit: Some(1),
            ..Query::all(Table::Shops)
        };
        let shop = self
            .gateway
            .query(&query)
            .await?
            .into_iter()
            .next()
            .map(into_shop)
            .transpose()?;

        Ok(shop.filter(ShopCredential::is_authorized))
    }

    /// Record an active installation, replacing any previous token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    pub async fn install(
        &self,
        shop_domain: &str,
        access_token: SecretString,
    ) -> Result<ShopCredential, RepositoryError> {
        let record = self
            .gateway
            .upsert(NewRecord::Shop(NewShopCredential::active(
                shop_domain,
                access_token,
            )))
            .await?;
        into_shop(record)
    }

    /// Clear the token and deactivate the shop. The row is kept.
    ///
    /// Returns `false` if the shop was never installed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the read or write fails.
    pub async fn revoke(&self, shop_domain: &str) -> Result<bool, RepositoryError> {
        if self.get(shop_domain).await?.is_none() {
            return Ok(false);
        }
        self.gateway
            .upsert(NewRecord::Shop(NewShopCredential::revoked(shop_domain)))
            .await?;
        Ok(true)
    }
}
