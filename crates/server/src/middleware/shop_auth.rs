//! Shop authentication extractor.
//!
//! The caller names its shop in the `x-shopify-shop-domain` header (or the
//! `shop` query parameter), normalized through `ShopDomain`. The request
//! passes only if that shop has an active credential holding a token. The
//! token is not checked against Shopify.

use axum::{extract::FromRequestParts, http::request::Parts};
use moonbox_core::ShopDomain;
use secrecy::SecretString;

use crate::db::ShopRepository;
use crate::error::{AppError, set_sentry_shop};
use crate::state::AppState;

/// Header naming the calling shop.
pub const SHOP_DOMAIN_HEADER: &str = "x-shopify-shop-domain";

/// The authenticated shop, available to handlers and as a request extension.
#[derive(Clone)]
pub struct ShopContext {
    pub shop_domain: String,
    pub access_token: SecretString,
}

impl std::fmt::Debug for ShopContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopContext")
            .field("shop_domain", &self.shop_domain)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Extractor that requires an installed shop.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireShop(shop): RequireShop) -> impl IntoResponse {
///     format!("Hello, {}!", shop.shop_domain)
/// }
/// ```
pub struct RequireShop(pub ShopContext);

/// Shop domain claimed by the request: header first, then `?shop=`.
fn claimed_shop(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(SHOP_DOMAIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned);

    from_header.or_else(|| {
        let query = parts.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, value)| key == "shop" && !value.trim().is_empty())
            .map(|(_, value)| value.trim().to_owned())
    })
}

impl FromRequestParts<AppState> for RequireShop {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claimed = claimed_shop(parts)
            .ok_or_else(|| AppError::Unauthenticated("Missing shop domain".to_string()))?;
        let shop_domain = ShopDomain::parse(&claimed)
            .map_err(|_| AppError::Unauthenticated("Invalid shop domain".to_string()))?
            .into_inner();

        let credential = ShopRepository::new(state.gateway())
            .find_authorized(&shop_domain)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Shop is not installed".to_string()))?;

        let access_token = credential
            .access_token
            .ok_or_else(|| AppError::Unauthenticated("Shop is not installed".to_string()))?;

        set_sentry_shop(&shop_domain);

        let context = ShopContext {
            shop_domain,
            access_token,
        };
        parts.extensions.insert(context.clone());
        Ok(Self(context))
    }
}
