// Router tests for the storefront API
// Drive the full axum router against the in-memory content API, with the
// payment gateway mocked where a test needs it.

use super::*;
use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::content::{queries, GatewaySettings};
use crate::payment::sign_payment;
use crate::test_support::InMemoryContentApi;

// ============================================================================
// Test Helpers
// ============================================================================

const OWNER: &str = "diner@example.com";
const GATEWAY_SECRET: &str = "s3cr3t";

struct TestApp {
    server: TestServer,
    api: Arc<InMemoryContentApi>,
    token: String,
}

fn test_config(payment_base: &str) -> Config {
    Config::from_lookup(|name| {
        let value = match name {
            "CONTENT_API_URL" => "https://content.example.com/graphql",
            "CONTENT_API_TOKEN" => "content-token",
            "RAZORPAY_KEY_ID" => "rzp_test_123",
            "RAZORPAY_KEY_SECRET" => GATEWAY_SECRET,
            "IDENTITY_JWT_SECRET" => "identity-secret",
            "RAZORPAY_API_URL" => payment_base,
            _ => return None,
        };
        Some(value.to_string())
    })
    .unwrap()
}

fn create_test_app(payment_base: &str) -> TestApp {
    let api = Arc::new(InMemoryContentApi::seeded());
    let state = AppState::new(
        test_config(payment_base),
        api.clone(),
        GatewaySettings::without_delays(),
    );
    let token = state.tokens.issue(OWNER, Some("Asha"), 3600);
    let server = TestServer::new(create_router(state)).unwrap();
    TestApp { server, api, token }
}

fn bearer(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

fn decimal(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

fn checkout_body(payment_mode: &str) -> serde_json::Value {
    json!({
        "address": {
            "full_name": "Asha Rao",
            "phone": "+91 98765 43210",
            "address_line": "12 MG Road",
            "city": "Bengaluru",
            "state": "Karnataka",
            "pincode": "560001",
            "landmark": "Near Metro"
        },
        "payment_mode": payment_mode
    })
}

async fn add_dish(app: &TestApp, category_slug: &str, menu_item_id: &str) {
    let response = bearer(app.server.post("/api/cart"), &app.token)
        .json(&json!({ "category_slug": category_slug, "menu_item_id": menu_item_id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
}

async fn payment_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_abc",
            "amount": 40400,
            "currency": "INR",
            "status": "created"
        })))
        .mount(&server)
        .await;
    server
}

// ============================================================================
// Catalog and health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = create_test_app("http://127.0.0.1:9");
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_categories_and_menu_items_are_public() {
    let app = create_test_app("http://127.0.0.1:9");

    let response = app.server.get("/api/categories").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let categories = response.json::<serde_json::Value>();
    assert!(categories
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c["slug"] == "biryani"));

    let response = app.server.get("/api/categories/beverages/items").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let items = response.json::<serde_json::Value>();
    assert!(items.as_array().unwrap().iter().any(|i| i["name"] == "Lassi"));
}

#[tokio::test]
async fn test_catalog_rate_limit_surfaces_as_429() {
    let app = create_test_app("http://127.0.0.1:9");
    app.api.rate_limit(queries::CATEGORIES.name, 10);

    let response = app.server.get("/api/categories").await;

    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.json::<serde_json::Value>()["error_code"], "rate_limited");
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_cart_requires_identity_token() {
    let app = create_test_app("http://127.0.0.1:9");

    let response = app.server.get("/api/cart").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<serde_json::Value>()["error_code"], "unauthorized");

    let response = bearer(app.server.get("/api/orders"), "not-a-jwt").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Cart and quote
// ============================================================================

#[tokio::test]
async fn test_cart_add_count_remove_clear() {
    let app = create_test_app("http://127.0.0.1:9");
    add_dish(&app, "biryani", "dish-1").await;
    add_dish(&app, "beverages", "dish-2").await;

    let count = bearer(app.server.get("/api/cart/count"), &app.token).await;
    assert_eq!(count.json::<serde_json::Value>()["count"], 2);

    let items = bearer(app.server.get("/api/cart"), &app.token)
        .await
        .json::<serde_json::Value>();
    let first_id = items[0]["id"].as_str().unwrap().to_string();

    let removed = bearer(app.server.delete(&format!("/api/cart/{}", first_id)), &app.token).await;
    assert_eq!(removed.status_code(), StatusCode::NO_CONTENT);

    let cleared = bearer(app.server.delete("/api/cart"), &app.token).await;
    assert_eq!(cleared.status_code(), StatusCode::OK);
    assert_eq!(cleared.json::<serde_json::Value>()["deleted"], 1);

    // Clearing again is a no-op
    let cleared = bearer(app.server.delete("/api/cart"), &app.token).await;
    assert_eq!(cleared.json::<serde_json::Value>()["deleted"], 0);
}

#[tokio::test]
async fn test_remove_unknown_item_is_404() {
    let app = create_test_app("http://127.0.0.1:9");
    let response = bearer(app.server.delete("/api/cart/missing"), &app.token).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_cart_item_is_400_with_field_details() {
    let app = create_test_app("http://127.0.0.1:9");
    let response = bearer(app.server.post("/api/cart"), &app.token)
        .json(&json!({ "category_slug": " ", "menu_item_id": "" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error_code"], "validation_error");
    assert!(body["details"]["category_slug"].is_array());
    assert!(body["details"]["menu_item_id"].is_array());
}

#[tokio::test]
async fn test_client_supplied_price_is_ignored() {
    let app = create_test_app("http://127.0.0.1:9");
    let response = bearer(app.server.post("/api/cart"), &app.token)
        .json(&json!({
            "category_slug": "biryani",
            "menu_item_id": "dish-1",
            "item_name": "Chicken Biryani",
            "unit_price": 0
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let items = bearer(app.server.get("/api/cart"), &app.token)
        .await
        .json::<serde_json::Value>();
    assert_eq!(decimal(&items[0]["unit_price"]), Decimal::from(250));

    let response = bearer(app.server.post("/api/checkout"), &app.token)
        .json(&checkout_body("cash_on_delivery"))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<serde_json::Value>();
    // 250 + 45 tax + 50 delivery
    assert_eq!(decimal(&body["confirmation"]["total"]), Decimal::from(345));
}

#[tokio::test]
async fn test_unknown_dish_is_404() {
    let app = create_test_app("http://127.0.0.1:9");
    let response = bearer(app.server.post("/api/cart"), &app.token)
        .json(&json!({ "category_slug": "beverages", "menu_item_id": "dish-1" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<serde_json::Value>()["error_code"],
        "menu_item_not_found"
    );
    assert_eq!(app.api.cart_len(OWNER), 0);
}

#[tokio::test]
async fn test_quote_with_and_without_coupon() {
    let app = create_test_app("http://127.0.0.1:9");
    add_dish(&app, "biryani", "dish-1").await;
    add_dish(&app, "beverages", "dish-2").await;

    let quote = bearer(app.server.post("/api/cart/quote"), &app.token)
        .json(&json!({}))
        .await;
    assert_eq!(quote.status_code(), StatusCode::OK);
    let quote = quote.json::<serde_json::Value>();
    assert_eq!(decimal(&quote["subtotal"]), Decimal::from(300));
    assert_eq!(decimal(&quote["tax"]), Decimal::from(54));
    assert_eq!(decimal(&quote["delivery_fee"]), Decimal::from(50));
    assert_eq!(decimal(&quote["total"]), Decimal::from(404));

    let with_coupon = bearer(app.server.post("/api/cart/quote"), &app.token)
        .json(&json!({ "coupon_code": " save50 " }))
        .await
        .json::<serde_json::Value>();
    assert_eq!(decimal(&with_coupon["discount"]), Decimal::from(50));
    assert_eq!(decimal(&with_coupon["total"]), Decimal::from(354));

    let rejected = bearer(app.server.post("/api/cart/quote"), &app.token)
        .json(&json!({ "coupon_code": "WELCOME15" }))
        .await;
    assert_eq!(rejected.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(rejected.json::<serde_json::Value>()["error_code"], "below_minimum");
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_cash_on_delivery_end_to_end() {
    let app = create_test_app("http://127.0.0.1:9");
    add_dish(&app, "biryani", "dish-1").await;
    add_dish(&app, "beverages", "dish-2").await;

    let response = bearer(app.server.post("/api/checkout"), &app.token)
        .json(&checkout_body("cash_on_delivery"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["status"], "confirmed");
    assert_eq!(
        body["trail"],
        json!([
            "collecting",
            "validating",
            "pricing",
            "persisting",
            "clearing_cart",
            "confirmed"
        ])
    );
    let confirmation = &body["confirmation"];
    assert_eq!(decimal(&confirmation["total"]), Decimal::from(404));
    assert_eq!(confirmation["payment_mode"], "cash_on_delivery");
    assert_eq!(confirmation["order"]["status"], "pending");
    assert_eq!(
        confirmation["address"],
        "12 MG Road, Bengaluru, Karnataka 560001, Near Metro"
    );

    let cart = bearer(app.server.get("/api/cart"), &app.token)
        .await
        .json::<serde_json::Value>();
    assert_eq!(cart, json!([]));

    let orders = bearer(app.server.get("/api/orders"), &app.token)
        .await
        .json::<serde_json::Value>();
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["phone"], "9876543210");
    assert_eq!(orders[0]["line_items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_checkout_accepts_legacy_payment_mode_name() {
    let app = create_test_app("http://127.0.0.1:9");
    add_dish(&app, "biryani", "dish-1").await;

    let response = bearer(app.server.post("/api/checkout"), &app.token)
        .json(&checkout_body("cod"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.json::<serde_json::Value>()["confirmation"]["payment_mode"],
        "cash_on_delivery"
    );
}

#[tokio::test]
async fn test_failed_order_save_keeps_cart() {
    let app = create_test_app("http://127.0.0.1:9");
    add_dish(&app, "biryani", "dish-1").await;
    add_dish(&app, "beverages", "dish-2").await;
    app.api.fail_operation(queries::CREATE_ORDER.name);

    let response = bearer(app.server.post("/api/checkout"), &app.token)
        .json(&checkout_body("cash_on_delivery"))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<serde_json::Value>()["error_code"], "order_save_failed");
    assert_eq!(app.api.cart_len(OWNER), 2);
    assert!(app.api.order_rows().is_empty());
}

#[tokio::test]
async fn test_invalid_address_reports_fields() {
    let app = create_test_app("http://127.0.0.1:9");
    add_dish(&app, "biryani", "dish-1").await;

    let mut body = checkout_body("cash_on_delivery");
    body["address"]["phone"] = json!("123");
    body["address"]["pincode"] = json!("56000A");

    let response = bearer(app.server.post("/api/checkout"), &app.token)
        .json(&body)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error_code"], "validation_error");
    assert!(body["details"]["phone"].is_array());
    assert!(body["details"]["pincode"].is_array());
    assert_eq!(app.api.call_count(queries::CREATE_ORDER.name), 0);
}

#[tokio::test]
async fn test_gateway_checkout_completes() {
    let gateway = payment_server().await;
    let app = create_test_app(&gateway.uri());
    add_dish(&app, "biryani", "dish-1").await;
    add_dish(&app, "beverages", "dish-2").await;

    let pending = bearer(app.server.post("/api/checkout"), &app.token)
        .json(&checkout_body("gateway"))
        .await
        .json::<serde_json::Value>();
    assert_eq!(pending["status"], "awaiting_payment");
    assert_eq!(pending["payment"]["gateway_order"]["id"], "order_abc");
    assert_eq!(pending["payment"]["key_id"], "rzp_test_123");
    let attempt_id = pending["payment"]["attempt_id"].as_str().unwrap().to_string();

    let signature = sign_payment("order_abc", "pay_xyz", GATEWAY_SECRET).unwrap();
    let response = bearer(
        app.server
            .post(&format!("/api/checkout/{}/complete", attempt_id)),
        &app.token,
    )
    .json(&json!({ "razorpay_payment_id": "pay_xyz", "razorpay_signature": signature }))
    .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["confirmation"]["order"]["payment_reference"], "pay_xyz");
    assert_eq!(app.api.cart_len(OWNER), 0);
}

#[tokio::test]
async fn test_paid_attempt_can_retry_failed_order_save() {
    let gateway = payment_server().await;
    let app = create_test_app(&gateway.uri());
    add_dish(&app, "biryani", "dish-1").await;
    add_dish(&app, "beverages", "dish-2").await;

    let pending = bearer(app.server.post("/api/checkout"), &app.token)
        .json(&checkout_body("gateway"))
        .await
        .json::<serde_json::Value>();
    let attempt_id = pending["payment"]["attempt_id"].as_str().unwrap().to_string();
    let complete_path = format!("/api/checkout/{}/complete", attempt_id);
    let signature = sign_payment("order_abc", "pay_xyz", GATEWAY_SECRET).unwrap();
    let report = json!({ "razorpay_payment_id": "pay_xyz", "razorpay_signature": signature });

    app.api.fail_operation(queries::CREATE_ORDER.name);
    let failed = bearer(app.server.post(&complete_path), &app.token)
        .json(&report)
        .await;
    assert_eq!(failed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(failed.json::<serde_json::Value>()["error_code"], "order_save_failed");
    assert_eq!(app.api.cart_len(OWNER), 2);

    app.api.restore_operation(queries::CREATE_ORDER.name);
    let retried = bearer(app.server.post(&complete_path), &app.token)
        .json(&report)
        .await;

    assert_eq!(retried.status_code(), StatusCode::OK);
    let body = retried.json::<serde_json::Value>();
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["confirmation"]["order"]["payment_reference"], "pay_xyz");
    assert_eq!(app.api.order_rows().len(), 1);
    assert_eq!(app.api.cart_len(OWNER), 0);
    // One payment order for the whole attempt
    assert_eq!(gateway.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_gateway_checkout_bad_signature_is_402() {
    let gateway = payment_server().await;
    let app = create_test_app(&gateway.uri());
    add_dish(&app, "biryani", "dish-1").await;

    let pending = bearer(app.server.post("/api/checkout"), &app.token)
        .json(&checkout_body("gateway"))
        .await
        .json::<serde_json::Value>();
    let attempt_id = pending["payment"]["attempt_id"].as_str().unwrap().to_string();

    let response = bearer(
        app.server
            .post(&format!("/api/checkout/{}/complete", attempt_id)),
        &app.token,
    )
    .json(&json!({ "payment_id": "pay_xyz", "signature": "0".repeat(64) }))
    .await;

    assert_eq!(response.status_code(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(response.json::<serde_json::Value>()["error_code"], "payment_unverified");
    assert_eq!(app.api.cart_len(OWNER), 1);
}

#[tokio::test]
async fn test_gateway_checkout_cancel() {
    let gateway = payment_server().await;
    let app = create_test_app(&gateway.uri());
    add_dish(&app, "biryani", "dish-1").await;

    let pending = bearer(app.server.post("/api/checkout"), &app.token)
        .json(&checkout_body("gateway"))
        .await
        .json::<serde_json::Value>();
    let attempt_id = pending["payment"]["attempt_id"].as_str().unwrap().to_string();

    let cancel_path = format!("/api/checkout/{}/cancel", attempt_id);
    let response = bearer(app.server.post(&cancel_path), &app.token).await;
    assert_eq!(response.status_code(), StatusCode::PAYMENT_REQUIRED);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error_code"], "payment_cancelled");
    assert_eq!(body["message"], "Payment was cancelled");

    // The attempt is gone once cancelled
    let response = bearer(app.server.post(&cancel_path), &app.token).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_submission_is_409() {
    let gateway = payment_server().await;
    let app = create_test_app(&gateway.uri());
    add_dish(&app, "biryani", "dish-1").await;

    let first = bearer(app.server.post("/api/checkout"), &app.token)
        .json(&checkout_body("gateway"))
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);

    let second = bearer(app.server.post("/api/checkout"), &app.token)
        .json(&checkout_body("gateway"))
        .await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);
    assert_eq!(second.json::<serde_json::Value>()["error_code"], "duplicate_submission");
}

// ============================================================================
// Payments
// ============================================================================

#[tokio::test]
async fn test_verify_endpoint() {
    let app = create_test_app("http://127.0.0.1:9");
    let signature = sign_payment("order_abc", "pay_xyz", GATEWAY_SECRET).unwrap();

    let valid = app
        .server
        .post("/api/payments/verify")
        .json(&json!({
            "gatewayOrderId": "order_abc",
            "paymentId": "pay_xyz",
            "signature": signature
        }))
        .await;
    assert_eq!(valid.status_code(), StatusCode::OK);
    assert_eq!(valid.json::<serde_json::Value>()["valid"], true);

    let invalid = app
        .server
        .post("/api/payments/verify")
        .json(&json!({
            "gatewayOrderId": "order_abc",
            "paymentId": "pay_other",
            "signature": signature
        }))
        .await;
    assert_eq!(invalid.status_code(), StatusCode::OK);
    assert_eq!(invalid.json::<serde_json::Value>()["valid"], false);

    let missing = app
        .server
        .post("/api/payments/verify")
        .json(&json!({ "gatewayOrderId": "order_abc" }))
        .await;
    assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(missing.json::<serde_json::Value>()["valid"], false);
}

#[tokio::test]
async fn test_payment_order_rejects_non_positive_amount() {
    let app = create_test_app("http://127.0.0.1:9");

    let response = app
        .server
        .post("/api/payments/order")
        .json(&json!({ "amount": 0 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<serde_json::Value>()["error_code"], "invalid_amount");
}
