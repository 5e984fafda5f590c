//! End-to-end tests for the wishlist API.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use moonbox_integration_tests::{TestApp, storefront};
use serde_json::json;

const SHOP_A: &str = "a.myshopify.com";
const SHOP_B: &str = "b.myshopify.com";

async fn app_with_shops() -> TestApp {
    let app = TestApp::new();
    app.install_shop(SHOP_A).await;
    app.install_shop(SHOP_B).await;
    app
}

#[tokio::test]
async fn test_duplicate_add_returns_existing_id() {
    let app = app_with_shops().await;
    let body = json!({ "product_id": "123", "shop_domain": SHOP_A });

    let first = app
        .post_json("/api/wishlist", &storefront(SHOP_A, "S1"), &body)
        .await;
    assert_eq!(first.status, StatusCode::OK);
    let first = first.json();
    assert_eq!(first["ok"], true);
    assert_eq!(first["item"]["product_id"], "123");
    assert_eq!(first["item"]["session_id"], "S1");
    assert!(first["item"]["customer_id"].is_null());
    let id = first["item"]["id"].clone();

    let second = app
        .post_json("/api/wishlist", &storefront(SHOP_A, "S1"), &body)
        .await
        .json();
    assert_eq!(second, json!({ "ok": true, "duplicated": true, "item_id": id }));

    let list = app
        .get("/api/wishlist", &storefront(SHOP_A, "S1"))
        .await
        .json();
    assert_eq!(list["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_numeric_ids_are_stored_as_strings() {
    let app = app_with_shops().await;

    let created = app
        .post_json(
            "/api/wishlist",
            &storefront(SHOP_A, "S1"),
            &json!({ "product_id": 987, "variant_id": 654, "product_title": "Lamp" }),
        )
        .await
        .json();
    assert_eq!(created["item"]["product_id"], "987");
    assert_eq!(created["item"]["variant_id"], "654");
    assert_eq!(created["item"]["product_title"], "Lamp");

    let again = app
        .post_json(
            "/api/wishlist",
            &storefront(SHOP_A, "S1"),
            &json!({ "product_id": "987", "variant_id": "654" }),
        )
        .await
        .json();
    assert_eq!(again["duplicated"], true);
}

#[tokio::test]
async fn test_variant_is_not_a_wildcard() {
    let app = app_with_shops().await;
    let headers = storefront(SHOP_A, "S1");

    let plain = app
        .post_json("/api/wishlist", &headers, &json!({ "product_id": "1" }))
        .await
        .json();
    let variant = app
        .post_json(
            "/api/wishlist",
            &headers,
            &json!({ "product_id": "1", "variant_id": "v1" }),
        )
        .await
        .json();
    let empty_variant = app
        .post_json(
            "/api/wishlist",
            &headers,
            &json!({ "product_id": "1", "variant_id": "" }),
        )
        .await
        .json();

    assert!(plain["item"].is_object());
    assert!(variant["item"].is_object());
    assert_ne!(plain["item"]["id"], variant["item"]["id"]);
    assert_eq!(empty_variant["duplicated"], true);
    assert_eq!(empty_variant["item_id"], plain["item"]["id"]);
}

#[tokio::test]
async fn test_add_requires_product_id() {
    let app = app_with_shops().await;

    let response = app
        .post_json(
            "/api/wishlist",
            &storefront(SHOP_A, "S1"),
            &json!({ "variant_id": "1" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("product_id"));
}

#[tokio::test]
async fn test_add_without_owner_is_rejected() {
    let app = app_with_shops().await;

    let response = app
        .post_json(
            "/api/wishlist",
            &[("x-shopify-shop-domain", SHOP_A)],
            &json!({ "product_id": "1" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["ok"], false);
}

#[tokio::test]
async fn test_session_from_cookie_and_body() {
    let app = app_with_shops().await;

    let from_cookie = app
        .post_json(
            "/api/wishlist",
            &[
                ("x-shopify-shop-domain", SHOP_A),
                ("cookie", "theme=dark; mb_session=C1"),
            ],
            &json!({ "product_id": "1" }),
        )
        .await
        .json();
    assert_eq!(from_cookie["item"]["session_id"], "C1");

    let from_body = app
        .post_json(
            "/api/wishlist",
            &[("x-shopify-shop-domain", SHOP_A)],
            &json!({ "product_id": "1", "session_id": "B1" }),
        )
        .await
        .json();
    assert_eq!(from_body["item"]["session_id"], "B1");

    let from_query = app
        .get(
            "/api/wishlist?session_id=B1",
            &[("x-shopify-shop-domain", SHOP_A)],
        )
        .await
        .json();
    assert_eq!(from_query["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_customer_id_takes_precedence_over_session() {
    let app = app_with_shops().await;

    let created = app
        .post_json(
            "/api/wishlist",
            &storefront(SHOP_A, "S1"),
            &json!({ "product_id": "5", "customer_id": 4242 }),
        )
        .await
        .json();
    assert_eq!(created["item"]["customer_id"], "4242");
    assert!(created["item"]["session_id"].is_null());

    let by_session = app
        .get("/api/wishlist", &storefront(SHOP_A, "S1"))
        .await
        .json();
    assert_eq!(by_session["items"], json!([]));

    let by_customer = app
        .get("/api/wishlist?customer_id=4242", &storefront(SHOP_A, "S1"))
        .await
        .json();
    assert_eq!(by_customer["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let app = app_with_shops().await;
    let headers = storefront(SHOP_A, "S1");

    for product in ["1", "2", "3"] {
        let response = app
            .post_json("/api/wishlist", &headers, &json!({ "product_id": product }))
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let list = app.get("/api/wishlist", &headers).await.json();
    let products: Vec<&str> = list["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["product_id"].as_str().unwrap())
        .collect();
    assert_eq!(products, ["3", "2", "1"]);
}

#[tokio::test]
async fn test_empty_list_is_ok() {
    let app = app_with_shops().await;

    let response = app.get("/api/wishlist", &storefront(SHOP_A, "nobody")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "ok": true, "items": [] }));
}

#[tokio::test]
async fn test_list_is_scoped_to_shop() {
    let app = app_with_shops().await;

    app.post_json(
        "/api/wishlist",
        &storefront(SHOP_B, "S1"),
        &json!({ "product_id": "1" }),
    )
    .await;

    let list = app.get("/api/wishlist", &storefront(SHOP_A, "S1")).await.json();
    assert_eq!(list["items"], json!([]));
}

#[tokio::test]
async fn test_remove_item() {
    let app = app_with_shops().await;
    let headers = storefront(SHOP_A, "S1");

    let created = app
        .post_json("/api/wishlist", &headers, &json!({ "product_id": "1" }))
        .await
        .json();
    let id = created["item"]["id"].as_i64().unwrap();

    let removed = app.delete(&format!("/api/wishlist/{id}"), &headers).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.json(), json!({ "ok": true }));

    let again = app.delete(&format!("/api/wishlist/{id}"), &headers).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let bogus = app.delete("/api/wishlist/not-a-number", &headers).await;
    assert_eq!(bogus.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cross_shop_delete_is_forbidden() {
    let app = app_with_shops().await;

    let created = app
        .post_json(
            "/api/wishlist",
            &storefront(SHOP_B, "S1"),
            &json!({ "product_id": "1" }),
        )
        .await
        .json();
    let id = created["item"]["id"].as_i64().unwrap();

    let response = app
        .delete(&format!("/api/wishlist/{id}"), &storefront(SHOP_A, "S1"))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.json()["ok"], false);

    let list = app.get("/api/wishlist", &storefront(SHOP_B, "S1")).await.json();
    assert_eq!(list["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_shop_is_unauthenticated() {
    let app = app_with_shops().await;

    let response = app
        .get("/api/wishlist", &storefront("ghost.myshopify.com", "S1"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let missing = app.get("/api/wishlist", &[("x-session-id", "S1")]).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_shop_from_query_parameter() {
    let app = app_with_shops().await;

    let response = app
        .get(
            &format!("/api/wishlist?shop={SHOP_A}"),
            &[("x-session-id", "S1")],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_numeric_display_fields_are_accepted() {
    let app = app_with_shops().await;

    let response = app
        .post_json(
            "/api/wishlist",
            &storefront(SHOP_A, "S1"),
            &json!({ "product_id": "1", "product_price": 19.99, "product_title": "Lamp" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["item"]["product_price"], "19.99");
    assert_eq!(body["item"]["product_title"], "Lamp");
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let app = app_with_shops().await;

    let request = Request::post("/api/wishlist")
        .header("content-type", "application/json")
        .header("x-shopify-shop-domain", SHOP_A)
        .header("x-session-id", "S1")
        .body(Body::from("{\"product_id\": "))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["ok"], false);
    assert!(body["error"].is_string());

    let wrong_type = app
        .post_json(
            "/api/wishlist",
            &storefront(SHOP_A, "S1"),
            &json!({ "product_id": ["1"] }),
        )
        .await;
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_type.json()["ok"], false);
}

#[tokio::test]
async fn test_body_without_content_type_is_a_validation_error() {
    let app = app_with_shops().await;

    let request = Request::post("/api/wishlist")
        .header("x-shopify-shop-domain", SHOP_A)
        .header("x-session-id", "S1")
        .body(Body::from(json!({ "product_id": "1" }).to_string()))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["ok"], false);
}

#[tokio::test]
async fn test_mixed_case_shop_header_is_normalized() {
    let app = app_with_shops().await;

    let created = app
        .post_json(
            "/api/wishlist",
            &storefront("A.MyShopify.com", "S1"),
            &json!({ "product_id": "1" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.json()["item"]["shop_domain"], SHOP_A);

    let list = app.get("/api/wishlist", &storefront(SHOP_A, "S1")).await.json();
    assert_eq!(list["items"].as_array().unwrap().len(), 1);
}
