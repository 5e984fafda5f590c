//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::PersistenceGateway;
use crate::shopify::OAuthClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The persistence backend is chosen at startup
/// and passed in explicitly.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    gateway: Arc<dyn PersistenceGateway>,
    oauth: OAuthClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AppConfig, gateway: Arc<dyn PersistenceGateway>) -> Self {
        let oauth = OAuthClient::new(&config.shopify);
        Self::with_oauth_client(config, gateway, oauth)
    }

    /// Create state with a preconfigured OAuth client.
    #[must_use]
    pub fn with_oauth_client(
        config: AppConfig,
        gateway: Arc<dyn PersistenceGateway>,
        oauth: OAuthClient,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                gateway,
                oauth,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the persistence gateway.
    #[must_use]
    pub fn gateway(&self) -> &dyn PersistenceGateway {
        self.inner.gateway.as_ref()
    }

    /// Get the Shopify OAuth client.
    #[must_use]
    pub fn oauth(&self) -> &OAuthClient {
        &self.inner.oauth
    }
}
