//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The domain is not hosted on one of the platform's shop suffixes.
    #[error("shop domain must end with one of: {}", ShopDomain::ALLOWED_SUFFIXES.join(", "))]
    UnsupportedHost,
    /// The store name (before the suffix) is empty or contains invalid characters.
    #[error("invalid store name: {0}")]
    InvalidStoreName(String),
}

/// A Shopify shop domain, e.g. `my-store.myshopify.com`.
///
/// Used as the tenant partition key throughout the system.
///
/// ## Constraints
///
/// - Length: 1-255 characters
/// - Must end with `.myshopify.com`, `.shopify.com`, `.myshopify.io` or `.shop.dev`
/// - Store name starts with an ASCII letter or digit and contains only
///   letters, digits, `-` and `_`
/// - Trailing slashes are stripped and ASCII letters lowercased
///
/// ## Examples
///
/// ```
/// use moonbox_core::ShopDomain;
///
/// let shop = ShopDomain::parse("demo.myshopify.com").unwrap();
/// assert_eq!(shop.store_name(), "demo");
///
/// assert!(ShopDomain::parse("").is_err());
/// assert!(ShopDomain::parse("evil.com").is_err());
/// assert!(ShopDomain::parse("https://demo.myshopify.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of a domain name.
    pub const MAX_LENGTH: usize = 255;

    /// Host suffixes accepted for shops.
    pub const ALLOWED_SUFFIXES: &'static [&'static str] = &[
        ".myshopify.com",
        ".shopify.com",
        ".myshopify.io",
        ".shop.dev",
    ];

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, not on an allowed
    /// host suffix, or has an invalid store name.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let normalized = s.trim().trim_end_matches('/').to_ascii_lowercase();
        let domain = normalized.as_str();

        if domain.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if domain.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let store_name = Self::ALLOWED_SUFFIXES
            .iter()
            .find_map(|suffix| domain.strip_suffix(suffix))
            .ok_or(ShopDomainError::UnsupportedHost)?;

        let mut chars = store_name.chars();
        let starts_alphanumeric = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
        let rest_valid = chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !starts_alphanumeric || !rest_valid {
            return Err(ShopDomainError::InvalidStoreName(store_name.to_owned()));
        }

        Ok(Self(normalized))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ShopDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the store name, the leading label before the platform suffix.
    ///
    /// This is the handle used in merchant admin URLs
    /// (`admin.shopify.com/store/{store_name}`).
    #[must_use]
    pub fn store_name(&self) -> &str {
        Self::ALLOWED_SUFFIXES
            .iter()
            .find_map(|suffix| self.0.strip_suffix(suffix))
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(value: ShopDomain) -> Self {
        value.0
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_domains() {
        assert!(ShopDomain::parse("demo.myshopify.com").is_ok());
        assert!(ShopDomain::parse("my-store_2.myshopify.com").is_ok());
        assert!(ShopDomain::parse("dev.myshopify.io").is_ok());
        assert!(ShopDomain::parse("shop1.shop.dev").is_ok());
    }

    #[test]
    fn test_parse_strips_trailing_slash() {
        let shop = ShopDomain::parse("demo.myshopify.com/").unwrap();
        assert_eq!(shop.as_str(), "demo.myshopify.com");
    }

    #[test]
    fn test_parse_lowercases() {
        let shop = ShopDomain::parse(" Moon-Goods.MyShopify.COM ").unwrap();
        assert_eq!(shop.as_str(), "moon-goods.myshopify.com");
        assert_eq!(shop, ShopDomain::parse("moon-goods.myshopify.com").unwrap());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ShopDomain::parse("   "), Err(ShopDomainError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}.myshopify.com", "a".repeat(250));
        assert!(matches!(
            ShopDomain::parse(&long),
            Err(ShopDomainError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_foreign_host() {
        assert_eq!(
            ShopDomain::parse("attacker.example.com"),
            Err(ShopDomainError::UnsupportedHost)
        );
        assert_eq!(
            ShopDomain::parse("myshopify.com.evil.io"),
            Err(ShopDomainError::UnsupportedHost)
        );
    }

    #[test]
    fn test_parse_rejects_bad_store_name() {
        assert!(matches!(
            ShopDomain::parse(".myshopify.com"),
            Err(ShopDomainError::InvalidStoreName(_))
        ));
        assert!(matches!(
            ShopDomain::parse("-store.myshopify.com"),
            Err(ShopDomainError::InvalidStoreName(_))
        ));
        assert!(matches!(
            ShopDomain::parse("https://demo.myshopify.com"),
            Err(ShopDomainError::InvalidStoreName(_))
        ));
        assert!(matches!(
            ShopDomain::parse("a.b.myshopify.com"),
            Err(ShopDomainError::InvalidStoreName(_))
        ));
    }

    #[test]
    fn test_store_name() {
        let shop = ShopDomain::parse("moon-goods.myshopify.com").unwrap();
        assert_eq!(shop.store_name(), "moon-goods");
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let shop: ShopDomain = serde_json::from_str("\"demo.myshopify.com\"").unwrap();
        assert_eq!(shop.as_str(), "demo.myshopify.com");
        assert!(serde_json::from_str::<ShopDomain>("\"nope\"").is_err());
    }
}
