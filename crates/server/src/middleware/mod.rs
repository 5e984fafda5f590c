//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (storefront, admin and frontend origins)
//! 5. Error detail (outside production only)
//! 6. Security headers
//! 7. Session layer (install flow only)
//!
//! The shop auth gate is an extractor, applied per handler.

pub mod cors;
pub mod error_detail;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod shop_auth;

pub use cors::{OriginPolicy, create_cors_layer};
pub use error_detail::error_detail_middleware;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use shop_auth::{RequireShop, SHOP_DOMAIN_HEADER, ShopContext};
