//! Shopify app OAuth route handlers.
//!
//! - `GET /auth` stores a random `state` nonce in the installer's session and
//!   redirects to the shop's authorization page.
//! - `GET /auth/callback` verifies the query signature, checks the nonce,
//!   exchanges the code and persists the shop credential.

use axum::{extract::State, response::Redirect};
use moonbox_core::ShopDomain;
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::AppQuery;
use crate::models::session_keys;
use crate::services::InstallService;
use crate::shopify::signature::verify_query;
use crate::state::AppState;

/// Query parameters for starting the OAuth flow.
#[derive(Debug, Deserialize)]
pub struct BeginQuery {
    pub shop: Option<String>,
}

/// Generate a cryptographically secure random string.
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect()
}

/// First value of `key` in the raw callback query.
fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

fn session_error(err: tower_sessions::session::Error) -> AppError {
    AppError::OAuth(format!("session store: {err}"))
}

/// Where the merchant lands once the app is installed.
fn admin_redirect_url(shop: &ShopDomain, api_key: &str, host: Option<&str>) -> String {
    let base = format!(
        "https://admin.shopify.com/store/{}/apps/{}",
        shop.store_name(),
        api_key
    );
    match host {
        Some(host) => format!("{base}?host={}", urlencoding::encode(host)),
        None => base,
    }
}

/// Start the OAuth flow for a shop.
///
/// # Route
///
/// `GET /auth?shop=<domain>`
#[instrument(skip(state, session))]
pub async fn begin(
    State(state): State<AppState>,
    session: Session,
    AppQuery(query): AppQuery<BeginQuery>,
) -> Result<Redirect> {
    let raw = query
        .shop
        .ok_or_else(|| AppError::Validation("Missing shop parameter".to_string()))?;
    let shop = ShopDomain::parse(&raw)
        .map_err(|e| AppError::Validation(format!("Invalid shop: {e}")))?;

    let nonce = generate_random_string(32);
    session
        .insert(session_keys::OAUTH_STATE, &nonce)
        .await
        .map_err(session_error)?;
    session
        .insert(session_keys::OAUTH_SHOP, shop.as_str())
        .await
        .map_err(session_error)?;

    let auth_url =
        state
            .oauth()
            .authorization_url(&shop, &state.config().callback_url(), &nonce);

    tracing::info!(shop = %shop, "Redirecting to Shopify authorization");
    Ok(Redirect::to(&auth_url))
}

/// Complete the OAuth flow.
///
/// A callback arriving without a pending nonce is accepted, since the
/// credential write is an upsert. A callback whose `state` disagrees with a
/// pending nonce is refused.
///
/// # Route
///
/// `GET /auth/callback`
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    AppQuery(params): AppQuery<Vec<(String, String)>>,
) -> Result<Redirect> {
    if !verify_query(&params, state.oauth().api_secret()) {
        tracing::warn!("Invalid HMAC signature in OAuth callback");
        return Err(AppError::Unauthenticated(
            "Invalid OAuth signature".to_string(),
        ));
    }

    let raw_shop = param(&params, "shop")
        .ok_or_else(|| AppError::Validation("Missing shop parameter".to_string()))?;
    let shop = ShopDomain::parse(raw_shop)
        .map_err(|e| AppError::Validation(format!("Invalid shop: {e}")))?;
    let code = param(&params, "code")
        .ok_or_else(|| AppError::Validation("Missing code parameter".to_string()))?;

    let pending: Option<String> = session
        .get(session_keys::OAUTH_STATE)
        .await
        .map_err(session_error)?;
    if let Some(expected) = pending {
        if param(&params, "state") != Some(expected.as_str()) {
            tracing::warn!(shop = %shop, "OAuth state mismatch");
            return Err(AppError::Forbidden("OAuth state mismatch".to_string()));
        }
        session
            .remove::<String>(session_keys::OAUTH_STATE)
            .await
            .map_err(session_error)?;
        session
            .remove::<String>(session_keys::OAUTH_SHOP)
            .await
            .map_err(session_error)?;
    } else {
        tracing::debug!(shop = %shop, "OAuth callback without pending state");
    }

    let token = state.oauth().exchange_code(&shop, code).await?;

    InstallService::new(state.gateway())
        .complete_oauth(shop.as_str(), token.access_token, token.scope)
        .await?;

    tracing::info!(shop = %shop, "Shop connected");
    Ok(Redirect::to(&admin_redirect_url(
        &shop,
        state.oauth().api_key(),
        param(&params, "host"),
    )))
}
