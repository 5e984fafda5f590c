//! OAuth session snapshots kept for compatibility with platform tooling.
//!
//! Authorization decisions never read these; the shop credential is the
//! source of truth.

use chrono::{DateTime, Utc};
use secrecy::SecretString;

/// A stored OAuth session.
#[derive(Clone)]
pub struct OAuthSession {
    pub id: String,
    pub shop: String,
    pub state: Option<String>,
    pub is_online: bool,
    pub scope: Option<String>,
    pub access_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user_id: Option<i64>,
    /// Serialized online access info, if any.
    pub user_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl core::fmt::Debug for OAuthSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OAuthSession")
            .field("id", &self.id)
            .field("shop", &self.shop)
            .field("is_online", &self.is_online)
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Session values to upsert (keyed by `id`).
#[derive(Clone)]
pub struct NewOAuthSession {
    pub id: String,
    pub shop: String,
    pub state: Option<String>,
    pub is_online: bool,
    pub scope: Option<String>,
    pub access_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user_id: Option<i64>,
    pub user_token: Option<String>,
}

impl NewOAuthSession {
    /// The offline session for a shop, as produced by the install callback.
    #[must_use]
    pub fn offline(shop: &str, access_token: SecretString, scope: Option<String>) -> Self {
        Self {
            id: format!("offline_{shop}"),
            shop: shop.to_owned(),
            state: None,
            is_online: false,
            scope,
            access_token: Some(access_token),
            expires_at: None,
            user_id: None,
            user_token: None,
        }
    }
}

impl core::fmt::Debug for NewOAuthSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewOAuthSession")
            .field("id", &self.id)
            .field("shop", &self.shop)
            .field("is_online", &self.is_online)
            .finish_non_exhaustive()
    }
}
