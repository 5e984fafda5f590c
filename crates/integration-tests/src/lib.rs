//! Integration tests for Moonbox.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`
//! against the in-memory gateway, so no database or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p moonbox-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use moonbox_server::config::{AppConfig, Environment, ShopifyAppConfig};
use moonbox_server::db::{MemoryGateway, ShopRepository};
use moonbox_server::shopify::OAuthClient;
use moonbox_server::state::AppState;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

/// Client secret shared by the test app and the request signers.
pub const API_SECRET: &str = "integration-test-secret";

/// Client ID of the test app.
pub const API_KEY: &str = "moonbox-test-key";

/// Configuration used by every test app.
#[must_use]
pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 8081,
        public_url: Url::parse("https://wishlist.example.test").unwrap(),
        frontend_url: "https://merchant.example.test".to_string(),
        environment: Environment::Development,
        database_url: None,
        seed_demo_data: false,
        shopify: ShopifyAppConfig {
            api_key: API_KEY.to_string(),
            api_secret: SecretString::from(API_SECRET),
            scopes: vec!["read_products".to_string(), "write_products".to_string()],
        },
        allowed_origins: Vec::new(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Parse the body as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// Value of a response header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The application under test plus a handle on its storage.
pub struct TestApp {
    pub router: Router,
    pub gateway: Arc<MemoryGateway>,
}

impl TestApp {
    /// App with the default test configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// App with a custom configuration.
    #[must_use]
    pub fn with_config(config: AppConfig) -> Self {
        let gateway = Arc::new(MemoryGateway::new());
        let state = AppState::new(config, gateway.clone());
        Self {
            router: moonbox_server::app(state),
            gateway,
        }
    }

    /// App whose OAuth token exchange goes to `origin`.
    #[must_use]
    pub fn with_token_endpoint(origin: &str) -> Self {
        let config = test_config();
        let gateway = Arc::new(MemoryGateway::new());
        let oauth = OAuthClient::with_endpoint_override(&config.shopify, origin);
        let state = AppState::with_oauth_client(config, gateway.clone(), oauth);
        Self {
            router: moonbox_server::app(state),
            gateway,
        }
    }

    /// Store an active credential for `shop`.
    pub async fn install_shop(&self, shop: &str) {
        ShopRepository::new(self.gateway.as_ref())
            .install(shop, SecretString::from("shpat_integration"))
            .await
            .unwrap();
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// `GET` with extra headers.
    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.send(build(
            Request::get(uri),
            headers,
            Body::empty(),
        ))
        .await
    }

    /// `DELETE` with extra headers.
    pub async fn delete(&self, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.send(build(
            Request::delete(uri),
            headers,
            Body::empty(),
        ))
        .await
    }

    /// `POST` a JSON body with extra headers.
    pub async fn post_json(&self, uri: &str, headers: &[(&str, &str)], body: &Value) -> TestResponse {
        let builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        self.send(build(builder, headers, Body::from(body.to_string())))
            .await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

fn build(
    mut builder: axum::http::request::Builder,
    headers: &[(&str, &str)],
    body: Body,
) -> Request<Body> {
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(body).unwrap()
}

/// Headers for a storefront call: shop and anonymous session.
#[must_use]
pub fn storefront<'a>(shop: &'a str, session: &'a str) -> [(&'a str, &'a str); 2] {
    [("x-shopify-shop-domain", shop), ("x-session-id", session)]
}
