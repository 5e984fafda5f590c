//! Wishlist item domain types.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use moonbox_core::{Owner, WishlistItemId};

/// Product details captured when the item was saved.
///
/// Display-only; never refreshed from the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub title: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
}

/// A saved product (optionally a specific variant) for one owner in one shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub shop_domain: String,
    pub owner: Owner,
    pub product_id: String,
    /// `None` means "any variant".
    pub variant_id: Option<String>,
    pub product: ProductSnapshot,
    pub created_at: DateTime<Utc>,
}

/// A wishlist item before storage assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWishlistItem {
    pub shop_domain: String,
    pub owner: Owner,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub product: ProductSnapshot,
}

/// Wire shape: storage columns, flat.
#[derive(Serialize)]
struct WishlistItemJson<'a> {
    id: WishlistItemId,
    shop_domain: &'a str,
    customer_id: Option<&'a str>,
    session_id: Option<&'a str>,
    product_id: &'a str,
    variant_id: Option<&'a str>,
    product_title: Option<&'a str>,
    product_price: Option<&'a str>,
    product_image_url: Option<&'a str>,
    created_at: DateTime<Utc>,
}

impl Serialize for WishlistItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WishlistItemJson {
            id: self.id,
            shop_domain: &self.shop_domain,
            customer_id: self.owner.customer_id(),
            session_id: self.owner.session_id(),
            product_id: &self.product_id,
            variant_id: self.variant_id.as_deref(),
            product_title: self.product.title.as_deref(),
            product_price: self.product.price.as_deref(),
            product_image_url: self.product.image_url.as_deref(),
            created_at: self.created_at,
        }
        .serialize(serializer)
    }
}
