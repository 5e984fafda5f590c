//! Shopify webhook handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use moonbox_core::ShopDomain;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::SHOP_DOMAIN_HEADER;
use crate::services::InstallService;
use crate::shopify::signature::{WEBHOOK_HMAC_HEADER, verify_webhook};
use crate::state::AppState;

const TOPIC_HEADER: &str = "x-shopify-topic";
const APP_UNINSTALLED: &str = "app/uninstalled";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Shop fields of the `app/uninstalled` payload.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UninstallPayload {
    myshopify_domain: Option<String>,
    domain: Option<String>,
}

/// Shop named in the webhook body, for deliveries without the shop header.
fn payload_shop(body: &[u8]) -> Option<String> {
    let payload: UninstallPayload = serde_json::from_slice(body).ok()?;
    [payload.myshopify_domain, payload.domain]
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
}

/// Handle the `app/uninstalled` webhook.
///
/// The signature covers the raw body, so the body is taken as bytes. Other
/// topics delivered here are acknowledged without action.
///
/// # Route
///
/// `POST /webhooks/app_uninstalled`
#[instrument(skip_all)]
pub async fn app_uninstalled(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let signature = header(&headers, WEBHOOK_HMAC_HEADER)
        .ok_or_else(|| AppError::Unauthenticated("Missing webhook signature".to_string()))?;

    if !verify_webhook(&body, signature, state.oauth().api_secret()) {
        tracing::warn!("Invalid webhook signature");
        return Err(AppError::Unauthenticated(
            "Invalid webhook signature".to_string(),
        ));
    }

    let topic = header(&headers, TOPIC_HEADER).unwrap_or_default();
    if topic != APP_UNINSTALLED {
        tracing::debug!(topic, "Ignoring webhook topic");
        return Ok(StatusCode::OK);
    }

    let raw_shop = header(&headers, SHOP_DOMAIN_HEADER)
        .map(str::to_owned)
        .or_else(|| payload_shop(&body))
        .ok_or_else(|| AppError::Validation("Missing shop domain".to_string()))?;
    let shop = ShopDomain::parse(&raw_shop)
        .map_err(|e| AppError::Validation(format!("Invalid shop domain: {e}")))?;

    InstallService::new(state.gateway())
        .uninstall(shop.as_str())
        .await?;
    Ok(StatusCode::OK)
}
