//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as
//! `{"ok": false, "error": "..."}` with the matching status code. The
//! internal description travels with the response as an [`ErrorDetail`]
//! extension; outside production, `error_detail_middleware` copies it into
//! the body as `detail`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::WishlistError;
use crate::shopify::ShopifyError;

/// Internal error description attached to error responses.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request input is missing or malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No customer or session identity on the request.
    #[error("Missing owner: provide customer_id or a session id")]
    MissingOwner,

    /// Caller is not an installed shop, or a signature did not verify.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Caller may not act on this resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage operation failed.
    #[error("Database error: {0}")]
    Persistence(#[from] RepositoryError),

    /// OAuth flow failed (token exchange, session state).
    #[error("OAuth error: {0}")]
    OAuth(String),
}

impl From<ShopifyError> for AppError {
    fn from(err: ShopifyError) -> Self {
        Self::OAuth(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<WishlistError> for AppError {
    fn from(err: WishlistError) -> Self {
        match err {
            WishlistError::MissingFields(_) => Self::Validation(err.to_string()),
            WishlistError::MissingOwner => Self::MissingOwner,
            WishlistError::NotFound => Self::NotFound("wishlist item".to_string()),
            WishlistError::Forbidden => Self::Forbidden(err.to_string()),
            WishlistError::Repository(inner) => Self::Persistence(inner),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MissingOwner => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Persistence(_) | Self::OAuth(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Server errors never reveal internals here.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Persistence(_) => "Internal server error".to_string(),
            Self::OAuth(_) => "OAuth flow failed".to_string(),
            Self::Validation(msg)
            | Self::Unauthenticated(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg) => msg.clone(),
            Self::MissingOwner => "Missing owner: provide customer_id or a session id".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Persistence(_) | Self::OAuth(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = json!({ "ok": false, "error": self.public_message() });
        let mut response = (self.status(), Json(body)).into_response();
        response
            .extensions_mut()
            .insert(ErrorDetail(self.to_string()));
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Tag the Sentry scope with the authenticated shop.
pub fn set_sentry_shop(shop_domain: &str) {
    sentry::configure_scope(|scope| {
        scope.set_tag("shop", shop_domain);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::MissingOwner.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Unauthenticated("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::OAuth("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Persistence(RepositoryError::NotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_wishlist_error_mapping() {
        let err: AppError = WishlistError::MissingFields(vec!["product_id"]).into();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("product_id")));

        let err: AppError = WishlistError::Forbidden.into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err: AppError = WishlistError::Repository(RepositoryError::NotFound).into();
        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_server_error_hides_internals() {
        let err = AppError::Persistence(RepositoryError::DataCorruption("bad row 7".into()));
        let response = err.into_response();

        let detail = response.extensions().get::<ErrorDetail>().cloned().unwrap();
        assert!(detail.0.contains("bad row 7"));

        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "Internal server error");
        assert!(json.get("detail").is_none());
    }

    #[tokio::test]
    async fn test_client_error_message() {
        let response = AppError::Validation("missing fields: product_id".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "missing fields: product_id");
    }
}
