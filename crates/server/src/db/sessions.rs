//! OAuth session snapshot repository.

use super::{Filter, NewRecord, PersistenceGateway, Query, Record, RepositoryError, Table};
use crate::models::{NewOAuthSession, OAuthSession};

fn into_session(record: Record) -> Result<OAuthSession, RepositoryError> {
    match record {
        Record::Session(session) => Ok(session),
        other => Err(RepositoryError::DataCorruption(format!(
            "expected session record, got {}",
            other.table().name()
        ))),
    }
}

fn by_shop(shop: &str) -> Query {
    Query {
        filters: vec![Filter::eq("shop", shop)],
        ..Query::all(Table::ShopifySessions)
    }
}

/// Repository for stored OAuth sessions.
pub struct SessionRepository<'a> {
    gateway: &'a dyn PersistenceGateway,
}

impl<'a> SessionRepository<'a> {
    #[must_use]
    pub const fn new(gateway: &'a dyn PersistenceGateway) -> Self {
        Self { gateway }
    }

    /// Insert or replace a session by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    pub async fn store(&self, session: NewOAuthSession) -> Result<OAuthSession, RepositoryError> {
        into_session(self.gateway.upsert(NewRecord::Session(session)).await?)
    }

    /// Sessions belonging to a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn find_by_shop(&self, shop: &str) -> Result<Vec<OAuthSession>, RepositoryError> {
        self.gateway
            .query(&by_shop(shop))
            .await?
            .into_iter()
            .map(into_session)
            .collect()
    }

    /// Delete every session for a shop. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the delete fails.
    pub async fn delete_by_shop(&self, shop: &str) -> Result<u64, RepositoryError> {
        self.gateway.delete(&by_shop(shop)).await
    }
}
