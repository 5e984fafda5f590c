//! Wishlist API route handlers.
//!
//! All routes sit behind the shop auth gate. The authenticated shop takes
//! precedence over any `shop_domain` in the body or query.

use axum::{Json, extract::State, http::HeaderMap};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::RequireShop;
use crate::models::ProductSnapshot;
use crate::services::{AddItem, AddOutcome, SessionSources, WishlistService};
use crate::state::AppState;

/// Accept a scalar sent as a JSON string or number.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Uint(u64),
        Float(f64),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|value| match value {
        Scalar::Text(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::Uint(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
    }))
}

/// Body of `POST /api/wishlist`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddItemRequest {
    #[serde(deserialize_with = "string_or_number")]
    pub product_id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub variant_id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub customer_id: Option<String>,
    pub session_id: Option<String>,
    pub shop_domain: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub product_title: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub product_price: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub product_image_url: Option<String>,
}

/// Query of `GET /api/wishlist`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub customer_id: Option<String>,
    pub session_id: Option<String>,
    pub shop_domain: Option<String>,
}

/// Save a product to the caller's wishlist.
///
/// # Route
///
/// `POST /api/wishlist`
#[instrument(skip_all, fields(shop = %shop.shop_domain))]
pub async fn add(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    headers: HeaderMap,
    AppJson(body): AppJson<AddItemRequest>,
) -> Result<Json<Value>> {
    let sessions = SessionSources::from_headers(&headers).with_body(body.session_id);
    let input = AddItem {
        product_id: body.product_id,
        shop_domain: Some(shop.shop_domain).or(body.shop_domain),
        variant_id: body.variant_id,
        customer_id: body.customer_id,
        product: ProductSnapshot {
            title: body.product_title,
            price: body.product_price,
            image_url: body.product_image_url,
        },
    };

    let outcome = WishlistService::new(state.gateway())
        .add(input, &sessions)
        .await?;

    Ok(Json(match outcome {
        AddOutcome::Created(item) => json!({ "ok": true, "item": item }),
        AddOutcome::Duplicate(item_id) => {
            json!({ "ok": true, "duplicated": true, "item_id": item_id })
        }
    }))
}

/// Remove an item from a wishlist.
///
/// # Route
///
/// `DELETE /api/wishlist/{item_id}`
#[instrument(skip(state, shop), fields(shop = %shop.shop_domain))]
pub async fn remove(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    AppPath(item_id): AppPath<String>,
) -> Result<Json<Value>> {
    WishlistService::new(state.gateway())
        .remove(&item_id, Some(&shop.shop_domain))
        .await?;

    Ok(Json(json!({ "ok": true })))
}

/// List the caller's wishlist, newest first.
///
/// # Route
///
/// `GET /api/wishlist`
#[instrument(skip_all, fields(shop = %shop.shop_domain))]
pub async fn list(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    headers: HeaderMap,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<Value>> {
    let sessions = SessionSources::from_headers(&headers).with_query(query.session_id);
    let shop_domain = Some(shop.shop_domain).or(query.shop_domain);

    let items = WishlistService::new(state.gateway())
        .list(
            shop_domain.as_deref(),
            query.customer_id.as_deref(),
            &sessions,
        )
        .await?;

    Ok(Json(json!({ "ok": true, "items": items })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let body: AddItemRequest =
            serde_json::from_str(r#"{"product_id": 123, "variant_id": "456"}"#).unwrap();
        assert_eq!(body.product_id.as_deref(), Some("123"));
        assert_eq!(body.variant_id.as_deref(), Some("456"));
        assert!(body.customer_id.is_none());
    }

    #[test]
    fn test_null_and_missing_ids() {
        let body: AddItemRequest =
            serde_json::from_str(r#"{"product_id": "1", "variant_id": null}"#).unwrap();
        assert!(body.variant_id.is_none());
        assert!(body.shop_domain.is_none());
    }

    #[test]
    fn test_numeric_price_is_kept_as_text() {
        let body: AddItemRequest = serde_json::from_str(
            r#"{"product_id": "1", "product_price": 19.99, "product_title": "Lamp"}"#,
        )
        .unwrap();
        assert_eq!(body.product_price.as_deref(), Some("19.99"));
        assert_eq!(body.product_title.as_deref(), Some("Lamp"));
        assert!(body.product_image_url.is_none());
    }

    #[test]
    fn test_large_numeric_id() {
        let body: AddItemRequest =
            serde_json::from_str(r#"{"product_id": 8123456789012}"#).unwrap();
        assert_eq!(body.product_id.as_deref(), Some("8123456789012"));
    }
}
