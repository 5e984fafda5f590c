//! Shop credential domain types.

use core::fmt;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use moonbox_core::ShopId;

/// Installation record for a shop.
///
/// A shop is authorized only while `is_active` is set and an access token is
/// present. Revocation clears the token and the flag but keeps the row.
#[derive(Clone)]
pub struct ShopCredential {
    pub id: ShopId,
    pub shop_domain: String,
    pub access_token: Option<SecretString>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShopCredential {
    /// Whether requests for this shop may pass the auth gate.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.is_active
            && self
                .access_token
                .as_ref()
                .is_some_and(|token| !token.expose_secret().is_empty())
    }
}

impl fmt::Debug for ShopCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopCredential")
            .field("id", &self.id)
            .field("shop_domain", &self.shop_domain)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Values written when installing (or revoking) a shop.
#[derive(Clone)]
pub struct NewShopCredential {
    pub shop_domain: String,
    pub access_token: Option<SecretString>,
    pub is_active: bool,
}

impl NewShopCredential {
    /// An active installation holding `access_token`.
    #[must_use]
    pub fn active(shop_domain: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            shop_domain: shop_domain.into(),
            access_token: Some(access_token),
            is_active: true,
        }
    }

    /// A revoked installation: no token, inactive.
    #[must_use]
    pub fn revoked(shop_domain: impl Into<String>) -> Self {
        Self {
            shop_domain: shop_domain.into(),
            access_token: None,
            is_active: false,
        }
    }
}

impl fmt::Debug for NewShopCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewShopCredential")
            .field("shop_domain", &self.shop_domain)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("is_active", &self.is_active)
            .finish()
    }
}
