//! Development-only error detail.
//!
//! Copies the [`ErrorDetail`] extension of an error response into its JSON
//! body as `detail`. Only layered when not running in production.

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::Response,
};

use crate::error::ErrorDetail;

/// Error bodies are small; anything larger is passed through untouched.
const MAX_ERROR_BODY: usize = 64 * 1024;

/// Expose internal error descriptions to the client.
pub async fn error_detail_middleware(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let Ok(bytes) = to_bytes(body, MAX_ERROR_BODY).await else {
        tracing::warn!("Error body too large to annotate");
        return Response::from_parts(parts, Body::empty());
    };

    let Ok(mut json) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    if let Some(object) = json.as_object_mut() {
        object.insert("detail".to_string(), serde_json::Value::String(detail));
    }

    let Ok(annotated) = serde_json::to_vec(&json) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(annotated))
}
