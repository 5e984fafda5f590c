//! Direct (manual) installation for custom apps.
//!
//! Merchants paste an Admin API token created in their own store; no OAuth
//! round trip happens.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Json, extract::State};
use moonbox_core::ShopDomain;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::AppJson;
use crate::services::InstallService;
use crate::state::AppState;

/// Manual install form.
#[derive(Template, WebTemplate)]
#[template(path = "install.html")]
pub struct InstallTemplate {
    pub scopes: String,
}

/// Body of `POST /install`.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct InstallRequest {
    pub shop_domain: Option<String>,
    pub access_token: Option<String>,
}

/// Render the manual install form.
///
/// # Route
///
/// `GET /install`
pub async fn form(State(state): State<AppState>) -> InstallTemplate {
    InstallTemplate {
        scopes: state.config().shopify.scopes.join(", "),
    }
}

/// Install a shop with a pasted access token.
///
/// # Route
///
/// `POST /install`
#[instrument(skip_all)]
pub async fn install(
    State(state): State<AppState>,
    AppJson(body): AppJson<InstallRequest>,
) -> Result<Json<Value>> {
    let shop_domain = body
        .shop_domain
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let access_token = body
        .access_token
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let (Some(shop_domain), Some(access_token)) = (shop_domain, access_token) else {
        let missing: Vec<&str> = [
            shop_domain.is_none().then_some("shop_domain"),
            access_token.is_none().then_some("access_token"),
        ]
        .into_iter()
        .flatten()
        .collect();
        return Err(AppError::Validation(format!(
            "Missing fields: {}",
            missing.join(", ")
        )));
    };

    let shop = ShopDomain::parse(shop_domain)
        .map_err(|e| AppError::Validation(format!("Invalid shop_domain: {e}")))?;

    InstallService::new(state.gateway())
        .install_direct(shop.as_str(), SecretString::from(access_token.to_owned()))
        .await?;

    Ok(Json(json!({
        "ok": true,
        "message": "App installed successfully",
        "redirect_url": state.config().install_redirect_url(),
    })))
}
