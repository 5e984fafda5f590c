//! Shopify app OAuth client and request signature verification.
//!
//! # OAuth Flow
//!
//! 1. Generate authorization URL with `authorization_url()` (offline access)
//! 2. Redirect the merchant to the shop's admin consent page
//! 3. Shopify redirects back with `code`, `shop`, `state`, `hmac`
//! 4. Verify the query with [`signature::verify_query`]
//! 5. Exchange the code for a token with `exchange_code()`
//!
//! Webhooks are signed separately: see [`signature::verify_webhook`].

pub mod signature;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use moonbox_core::ShopDomain;

use crate::config::ShopifyAppConfig;

/// Errors that can occur when talking to Shopify.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token endpoint answered with a non-success status.
    #[error("Token exchange failed ({status}): {body}")]
    TokenExchange { status: u16, body: String },
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default)]
    scope: Option<String>,
}

/// An offline access token for one shop.
#[derive(Clone)]
pub struct OAuthToken {
    pub access_token: SecretString,
    pub scope: Option<String>,
}

impl std::fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}

/// Shopify app OAuth client.
///
/// Unlike a single-store client, every call names the shop it targets.
#[derive(Clone)]
pub struct OAuthClient {
    inner: Arc<OAuthClientInner>,
}

struct OAuthClientInner {
    client: reqwest::Client,
    api_key: String,
    api_secret: SecretString,
    scopes: Vec<String>,
    /// Replaces `https://{shop}` as the token endpoint origin.
    endpoint_override: Option<String>,
}

impl OAuthClient {
    /// Create a new OAuth client.
    #[must_use]
    pub fn new(config: &ShopifyAppConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a client whose token exchange targets `origin` instead of the shop.
    ///
    /// Intended for pointing the exchange at a local stub server.
    #[must_use]
    pub fn with_endpoint_override(config: &ShopifyAppConfig, origin: impl Into<String>) -> Self {
        Self::build(config, Some(origin.into()))
    }

    fn build(config: &ShopifyAppConfig, endpoint_override: Option<String>) -> Self {
        Self {
            inner: Arc::new(OAuthClientInner {
                client: reqwest::Client::new(),
                api_key: config.api_key.clone(),
                api_secret: config.api_secret.clone(),
                scopes: config.scopes.clone(),
                endpoint_override: endpoint_override
                    .map(|origin| origin.trim_end_matches('/').to_owned()),
            }),
        }
    }

    /// Get the app's client ID.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    /// Get the client secret (for HMAC verification).
    #[must_use]
    pub fn api_secret(&self) -> &str {
        self.inner.api_secret.expose_secret()
    }

    /// Generate the OAuth authorization URL for a shop.
    ///
    /// No per-user grant option is requested, so the resulting token is an
    /// offline token.
    #[must_use]
    pub fn authorization_url(&self, shop: &ShopDomain, redirect_uri: &str, state: &str) -> String {
        let scope = self.inner.scopes.join(",");
        format!(
            "https://{}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
            shop,
            urlencoding::encode(&self.inner.api_key),
            urlencoding::encode(&scope),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    fn token_url(&self, shop: &ShopDomain) -> String {
        match &self.inner.endpoint_override {
            Some(origin) => format!("{origin}/admin/oauth/access_token"),
            None => format!("https://{shop}/admin/oauth/access_token"),
        }
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::TokenExchange` if Shopify rejects the code.
    /// Returns `ShopifyError::Http` if the HTTP request fails.
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<OAuthToken, ShopifyError> {
        let params = [
            ("client_id", self.inner.api_key.as_str()),
            ("client_secret", self.inner.api_secret.expose_secret()),
            ("code", code),
        ];

        let response = self
            .inner
            .client
            .post(self.token_url(shop))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShopifyError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let token: OAuthTokenResponse = response.json().await?;
        Ok(OAuthToken {
            access_token: SecretString::from(token.access_token),
            scope: token.scope,
        })
    }
}
