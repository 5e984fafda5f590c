//! Keys for values kept in the installer's browser session.

/// Session keys used by the install flow.
pub mod keys {
    /// Pending OAuth `state` nonce (CSRF protection).
    pub const OAUTH_STATE: &str = "shopify_oauth_state";

    /// Shop the pending `state` nonce was issued for.
    pub const OAUTH_SHOP: &str = "shopify_oauth_shop";
}
