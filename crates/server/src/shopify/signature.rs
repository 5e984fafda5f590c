//! HMAC-SHA256 signatures on OAuth redirects and webhooks.
//!
//! - OAuth redirects: hex digest over the query pairs (minus `hmac` and
//!   `signature`), sorted by key, joined as `k=v` with `&`.
//! - Webhooks: base64 digest over the raw request body, sent in
//!   `X-Shopify-Hmac-Sha256`.
//!
//! Comparison goes through `Mac::verify_slice`, which is constant time.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Webhook signature header.
pub const WEBHOOK_HMAC_HEADER: &str = "x-shopify-hmac-sha256";

fn mac(secret: &str) -> Option<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes()).ok()
}

/// Canonical message for a signed query.
fn query_message(params: &[(String, String)]) -> String {
    let mut pairs: Vec<&(String, String)> = params
        .iter()
        .filter(|(key, _)| key != "hmac" && key != "signature")
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex signature Shopify would attach to these query params.
#[must_use]
pub fn sign_query(params: &[(String, String)], secret: &str) -> String {
    let Some(mut mac) = mac(secret) else {
        return String::new();
    };
    mac.update(query_message(params).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify the `hmac` parameter of an OAuth redirect.
///
/// Returns `false` if `hmac` is missing or not valid hex.
#[must_use]
pub fn verify_query(params: &[(String, String)], secret: &str) -> bool {
    let Some((_, provided)) = params.iter().find(|(key, _)| key == "hmac") else {
        return false;
    };
    let Ok(provided) = hex::decode(provided) else {
        return false;
    };
    let Some(mut mac) = mac(secret) else {
        return false;
    };
    mac.update(query_message(params).as_bytes());
    mac.verify_slice(&provided).is_ok()
}

/// Base64 signature Shopify would send for this webhook body.
#[must_use]
pub fn sign_webhook(body: &[u8], secret: &str) -> String {
    let Some(mut mac) = mac(secret) else {
        return String::new();
    };
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Verify a webhook body against its `X-Shopify-Hmac-Sha256` header value.
#[must_use]
pub fn verify_webhook(body: &[u8], header: &str, secret: &str) -> bool {
    let Ok(provided) = STANDARD.decode(header.trim()) else {
        return false;
    };
    let Some(mut mac) = mac(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}
