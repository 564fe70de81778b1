//! Cart API tests against the in-process storefront.

#![allow(clippy::unwrap_used)]

use serde_json::json;

use storehouse_core::{Email, codes};
use storehouse_integration_tests::TestContext;
use storehouse_storefront::db::Store;
use storehouse_storefront::models::AddressKind;

#[tokio::test]
async fn test_health_endpoints() {
    let mut ctx = TestContext::new();
    let live = ctx.get("/health").await;
    assert_eq!(live.text(), "ok");
    let ready = ctx.get("/health/ready").await;
    assert!(ready.status.is_success());
}

#[tokio::test]
async fn test_first_add_creates_active_cart() {
    let mut ctx = TestContext::new();
    let mug = ctx.product("Enamel Mug", Some("MUG-1"), Some(1000)).await;

    let envelope = ctx
        .post("/api/cart/add", &json!({"product_id": mug.id, "quantity": 2}))
        .await
        .envelope();
    assert!(envelope.success);
    assert_eq!(envelope.code, codes::OK);
    assert_eq!(envelope.message, "Enamel Mug successfully added to cart.");

    let mini = ctx.get("/api/cart/mini").await.json();
    assert_eq!(mini["count"], 1);
    assert_eq!(mini["quantity"], 2);
    assert_eq!(mini["total"], 2000);
    assert_eq!(mini["items"][mug.id.to_string()]["qty"], 2);
    assert_eq!(mini["items"][mug.id.to_string()]["sku"], "MUG-1");
}

#[tokio::test]
async fn test_repeated_adds_reuse_the_active_cart() {
    let mut ctx = TestContext::new();
    let mug = ctx.product("Enamel Mug", Some("MUG-1"), Some(1000)).await;

    ctx.post("/api/cart/add", &json!({"product_id": mug.id})).await;
    ctx.post("/api/cart/add", &json!({"product_id": mug.id, "quantity": 0}))
        .await;

    let mini = ctx.get("/api/cart/mini").await.json();
    assert_eq!(mini["count"], 1);
    assert_eq!(mini["quantity"], 2);
}

#[tokio::test]
async fn test_unavailable_product_leaves_cart_untouched() {
    let mut ctx = TestContext::new();
    let retired = ctx.unavailable_product("Retired Poster").await;

    let envelope = ctx
        .post("/api/cart/add", &json!({"product_id": retired.id}))
        .await
        .envelope();
    assert!(!envelope.success);
    assert_eq!(envelope.code, codes::NOT_AVAILABLE);

    let mini = ctx.get("/api/cart/mini").await.json();
    assert_eq!(mini["count"], 0);
    assert!(mini["total"].is_null());
    assert_eq!(mini["items"], json!({}));
}

#[tokio::test]
async fn test_add_rejects_bad_input() {
    let mut ctx = TestContext::new();
    let mug = ctx.product("Enamel Mug", None, Some(1000)).await;

    let missing = ctx.post("/api/cart/add", &json!({})).await.envelope();
    assert_eq!(missing.code, codes::INVALID_REQUEST);

    let negative = ctx
        .post("/api/cart/add", &json!({"product_id": mug.id, "quantity": -3}))
        .await
        .envelope();
    assert_eq!(negative.code, codes::INVALID_REQUEST);

    let unknown = ctx
        .post("/api/cart/add", &json!({"product_id": 9999}))
        .await
        .envelope();
    assert_eq!(unknown.code, codes::NOT_AVAILABLE);
}

#[tokio::test]
async fn test_variant_selected_by_options() {
    let mut ctx = TestContext::new();
    let shirt = ctx.product("T-Shirt", None, Some(2500)).await;
    ctx.variant(shirt.id, "T-Shirt - S", "TEE-S", &[("size", "S")])
        .await;
    let medium = ctx
        .variant(shirt.id, "T-Shirt - M", "TEE-M", &[("size", "M")])
        .await;

    let envelope = ctx
        .post(
            "/api/cart/add",
            &json!({"product_id": shirt.id, "options": {"size": "M"}}),
        )
        .await
        .envelope();
    assert!(envelope.success);
    assert_eq!(envelope.message, "T-Shirt - M successfully added to cart.");

    let mini = ctx.get("/api/cart/mini").await.json();
    assert_eq!(mini["items"][medium.id.to_string()]["qty"], 1);

    let missing = ctx
        .post(
            "/api/cart/add",
            &json!({"product_id": shirt.id, "options": {"size": "XXL"}}),
        )
        .await
        .envelope();
    assert_eq!(missing.code, codes::NOT_AVAILABLE);
}

#[tokio::test]
async fn test_remove_all_sentinel_drops_line() {
    let mut ctx = TestContext::new();
    let mug = ctx.product("Enamel Mug", None, Some(1000)).await;
    ctx.post("/api/cart/add", &json!({"product_id": mug.id, "quantity": 4}))
        .await;

    let envelope = ctx
        .post("/api/cart/remove", &json!({"product_id": mug.id, "quantity": -1}))
        .await
        .envelope();
    assert!(envelope.success);
    assert_eq!(envelope.message, "Product successfully removed from cart.");

    let mini = ctx.get("/api/cart/mini").await.json();
    assert_eq!(mini["count"], 0);
}

#[tokio::test]
async fn test_remove_fewer_decrements() {
    let mut ctx = TestContext::new();
    let mug = ctx.product("Enamel Mug", None, Some(1000)).await;
    ctx.post("/api/cart/add", &json!({"product_id": mug.id, "quantity": 5}))
        .await;

    ctx.post("/api/cart/remove", &json!({"product_id": mug.id, "quantity": 2}))
        .await;

    let mini = ctx.get("/api/cart/mini").await.json();
    assert_eq!(mini["items"][mug.id.to_string()]["qty"], 3);
}

#[tokio::test]
async fn test_remove_missing_product_reports_failure() {
    let mut ctx = TestContext::new();
    let mug = ctx.product("Enamel Mug", None, Some(1000)).await;
    let sticker = ctx.product("Sticker", None, Some(300)).await;
    ctx.post("/api/cart/add", &json!({"product_id": mug.id})).await;

    let envelope = ctx
        .post("/api/cart/remove", &json!({"product_id": sticker.id}))
        .await
        .envelope();
    assert!(!envelope.success);
    assert_eq!(envelope.code, codes::ERROR);
}

#[tokio::test]
async fn test_empty_cart_signals_noop() {
    let mut ctx = TestContext::new();
    let mug = ctx.product("Enamel Mug", None, Some(1000)).await;

    let no_cart = ctx.post("/api/cart/empty", &json!({})).await.envelope();
    assert!(!no_cart.success);

    ctx.post("/api/cart/add", &json!({"product_id": mug.id})).await;
    let emptied = ctx.post("/api/cart/empty", &json!({})).await.envelope();
    assert!(emptied.success);
    assert_eq!(emptied.message, "Cart successfully emptied.");

    let again = ctx.post("/api/cart/empty", &json!({})).await.envelope();
    assert!(!again.success);
}

#[tokio::test]
async fn test_set_status_by_name_and_id() {
    let mut ctx = TestContext::new();
    let mug = ctx.product("Enamel Mug", None, Some(1000)).await;
    ctx.post("/api/cart/add", &json!({"product_id": mug.id})).await;

    let by_name = ctx
        .post("/api/cart/status", &json!({"status": "On Hold"}))
        .await
        .envelope();
    assert!(by_name.success);
    assert_eq!(by_name.message, "Cart status set to On Hold.");

    // The in-memory store seeds `active` with id 2.
    let by_id = ctx
        .post("/api/cart/status", &json!({"status": 2}))
        .await
        .envelope();
    assert_eq!(by_id.message, "Cart status set to active.");

    let unknown = ctx
        .post("/api/cart/status", &json!({"status": 4040}))
        .await
        .envelope();
    assert_eq!(unknown.code, codes::INVALID_REQUEST);
}

#[tokio::test]
async fn test_carts_are_per_session() {
    let mut ctx = TestContext::new();
    let mug = ctx.product("Enamel Mug", None, Some(1000)).await;
    ctx.post("/api/cart/add", &json!({"product_id": mug.id})).await;

    let mut other = ctx.fresh_client();
    let mini = other.get("/api/cart/mini").await.json();
    assert_eq!(mini["count"], 0);
}

#[tokio::test]
async fn test_malformed_body_is_an_envelope() {
    let mut ctx = TestContext::new();
    let response = ctx.post("/api/cart/add", &json!("not an object")).await;
    assert_eq!(response.envelope().code, codes::INVALID_REQUEST);
}

#[tokio::test]
async fn test_other_sessions_cannot_target_a_cart_by_id() {
    let mut ctx = TestContext::new();
    let mug = ctx.product("Enamel Mug", Some("MUG-1"), Some(1000)).await;
    let nonce = ctx.nonce("signup").await;
    ctx.post(
        "/api/customers",
        &json!({"email": "owner@example.com", "password": "long enough pw", "nonce": nonce}),
    )
    .await;
    ctx.post("/api/cart/add", &json!({"product_id": mug.id, "quantity": 3}))
        .await;

    let email = Email::parse("owner@example.com").unwrap();
    let (customer, _) = ctx.store.get_customer_credentials(&email).await.unwrap().unwrap();
    let cart_id = customer.active_cart_id.unwrap();
    let before = ctx.store.get_cart(cart_id).await.unwrap().unwrap();

    let mut stranger = ctx.fresh_client();
    let address = json!({"line_1": "9 Elm St", "city": "Salem", "state": "OR", "zip": "97301"});
    let attempts = [
        ("/api/cart/empty", json!({"cart_id": cart_id})),
        ("/api/cart/remove", json!({"cart_id": cart_id, "product_id": mug.id})),
        ("/api/cart/add", json!({"cart_id": cart_id, "product_id": mug.id})),
        ("/api/cart/status", json!({"cart_id": cart_id, "status": "shipped"})),
        ("/api/addresses", json!({"cart_id": cart_id, "address": address, "shipping": true})),
        ("/api/shipping/quote", json!({"cart_id": cart_id, "address": address})),
    ];
    for (path, body) in &attempts {
        let envelope = stranger.post(path, body).await.envelope();
        assert!(!envelope.success, "{path}");
        assert_eq!(envelope.code, codes::NOT_AVAILABLE, "{path}");
    }

    let after = ctx.store.get_cart(cart_id).await.unwrap().unwrap();
    assert_eq!(after.items.quantity(mug.id), 3);
    assert_eq!(after.status_id, before.status_id);
    assert!(
        ctx.store
            .first_address(cart_id, AddressKind::Shipping)
            .await
            .unwrap()
            .is_none()
    );
    assert!(ctx.shipping.shipments().is_empty());

    let mini = ctx.get("/api/cart/mini").await.json();
    assert_eq!(mini["quantity"], 3);
    assert_eq!(mini["total"], 3000);
}
