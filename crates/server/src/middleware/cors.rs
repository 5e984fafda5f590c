//! CORS configuration.
//!
//! Storefront themes call the wishlist API from `*.myshopify.com` and the
//! embedded admin runs under `admin.shopify.com`. Tunnel hosts and
//! localhost are accepted only outside production.

use std::sync::LazyLock;

use axum::http::{HeaderName, HeaderValue, Method, header::CONTENT_TYPE, request::Parts};
use regex::Regex;
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::shop_auth::SHOP_DOMAIN_HEADER;
use crate::config::AppConfig;
use crate::services::SESSION_HEADER;

static SHOPIFY_ORIGINS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^https://admin\.shopify\.com$",
        r"^https://[a-z0-9][a-z0-9-]*\.myshopify\.com$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid regex"))
    .collect()
});

static DEV_ORIGINS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^https://[a-z0-9-]+\.ngrok-free\.app$",
        r"^https://[a-z0-9-]+\.ngrok\.io$",
        r"^https://[a-z0-9-]+\.trycloudflare\.com$",
        r"^http://localhost(:\d+)?$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid regex"))
    .collect()
});

/// Decides which browser origins may call the API.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    exact: Vec<String>,
    allow_dev: bool,
}

impl OriginPolicy {
    /// Build the policy from configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let mut exact = Vec::with_capacity(config.allowed_origins.len() + 1);
        exact.push(config.frontend_url.trim_end_matches('/').to_string());
        exact.extend(
            config
                .allowed_origins
                .iter()
                .map(|o| o.trim_end_matches('/').to_string()),
        );

        Self {
            exact,
            allow_dev: !config.environment.is_production(),
        }
    }

    /// Whether `origin` is allowed.
    #[must_use]
    pub fn allows(&self, origin: &str) -> bool {
        if self.exact.iter().any(|o| o == origin) {
            return true;
        }
        if SHOPIFY_ORIGINS.iter().any(|re| re.is_match(origin)) {
            return true;
        }
        self.allow_dev && DEV_ORIGINS.iter().any(|re| re.is_match(origin))
    }
}

/// Create the CORS layer for the whole router.
///
/// Credentials are allowed so the storefront can send the session cookie.
#[must_use]
pub fn create_cors_layer(config: &AppConfig) -> CorsLayer {
    let policy = OriginPolicy::from_config(config);

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin.to_str().is_ok_and(|o| policy.allows(o))
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(SHOP_DOMAIN_HEADER),
            HeaderName::from_static(SESSION_HEADER),
        ])
        .allow_credentials(true)
}
