//! Customer registration, sign-on and guest cart adoption.

#![allow(clippy::unwrap_used)]

use serde_json::{Value, json};

use storehouse_core::{Email, codes};
use storehouse_integration_tests::TestContext;
use storehouse_storefront::db::Store;

const EMAIL: &str = "shopper@example.com";
const PASSWORD: &str = "correct horse battery";

fn signup_body(nonce: Option<&str>) -> Value {
    json!({
        "email": EMAIL,
        "password": PASSWORD,
        "first_name": "Sam",
        "last_name": "Shopper",
        "nonce": nonce,
    })
}

async fn register(ctx: &mut TestContext) {
    let nonce = ctx.nonce("signup").await;
    let envelope = ctx
        .post("/api/customers", &signup_body(Some(&nonce)))
        .await
        .envelope();
    assert!(envelope.success, "{envelope:?}");
}

#[tokio::test]
async fn test_nonce_is_scoped_by_purpose() {
    let mut ctx = TestContext::new();
    let body = ctx.get("/api/nonce/signup").await.json();
    assert_eq!(body["purpose"], "signup");
    assert!(!body["nonce"].as_str().unwrap().is_empty());

    let unknown = ctx.get("/api/nonce/checkout").await.envelope();
    assert_eq!(unknown.code, codes::INVALID_REQUEST);
}

#[tokio::test]
async fn test_create_without_nonce_creates_nothing() {
    let mut ctx = TestContext::new();

    let envelope = ctx.post("/api/customers", &signup_body(None)).await.envelope();
    assert!(!envelope.success);
    assert_eq!(envelope.code, codes::FAILED_NONCE);

    let email = Email::parse(EMAIL).unwrap();
    assert!(ctx.store.get_customer_credentials(&email).await.unwrap().is_none());
}

#[tokio::test]
async fn test_login_nonce_does_not_authorize_signup() {
    let mut ctx = TestContext::new();
    let login = ctx.nonce("login").await;

    let envelope = ctx
        .post("/api/customers", &signup_body(Some(&login)))
        .await
        .envelope();
    assert_eq!(envelope.code, codes::FAILED_NONCE);
}

#[tokio::test]
async fn test_create_and_sign_on() {
    let mut ctx = TestContext::new();
    register(&mut ctx).await;

    let email = Email::parse(EMAIL).unwrap();
    let (customer, hash) = ctx.store.get_customer_credentials(&email).await.unwrap().unwrap();
    assert_eq!(customer.first_name, "Sam");
    assert!(hash.unwrap().starts_with("$argon2"));

    let mut other = ctx.fresh_client();
    let nonce = other.nonce("login").await;
    let envelope = other
        .post(
            "/api/customers/sign-on",
            &json!({"email": EMAIL, "password": PASSWORD, "nonce": nonce}),
        )
        .await
        .envelope();
    assert!(envelope.success);
    assert_eq!(envelope.message, "Login Successful");
}

#[tokio::test]
async fn test_sign_on_rejections() {
    let mut ctx = TestContext::new();
    register(&mut ctx).await;

    let mut other = ctx.fresh_client();
    let no_nonce = other
        .post(
            "/api/customers/sign-on",
            &json!({"email": EMAIL, "password": PASSWORD}),
        )
        .await
        .envelope();
    assert_eq!(no_nonce.code, codes::FAILED_NONCE);

    let nonce = other.nonce("login").await;
    let wrong = other
        .post(
            "/api/customers/sign-on",
            &json!({"email": EMAIL, "password": "not the password", "nonce": nonce}),
        )
        .await
        .envelope();
    assert!(!wrong.success);
    assert_eq!(wrong.message, "Wrong username or password");
}

#[tokio::test]
async fn test_registration_validation() {
    let mut ctx = TestContext::new();

    let nonce = ctx.nonce("signup").await;
    let weak = ctx
        .post(
            "/api/customers",
            &json!({"email": EMAIL, "password": "short", "nonce": nonce}),
        )
        .await
        .envelope();
    assert_eq!(weak.code, codes::WEAK_PASSWORD);

    let bad_email = ctx
        .post(
            "/api/customers",
            &json!({"email": "not-an-email", "password": PASSWORD, "nonce": nonce}),
        )
        .await
        .envelope();
    assert_eq!(bad_email.code, codes::INVALID_EMAIL);

    register(&mut ctx).await;
    let mut other = ctx.fresh_client();
    let nonce = other.nonce("signup").await;
    let duplicate = other
        .post("/api/customers", &signup_body(Some(&nonce)))
        .await
        .envelope();
    assert_eq!(duplicate.code, codes::CUSTOMER_EXISTS);
}

#[tokio::test]
async fn test_guest_cart_is_adopted_on_signup() {
    let mut ctx = TestContext::new();
    let mug = ctx.product("Enamel Mug", Some("MUG-1"), Some(1000)).await;
    ctx.post("/api/cart/add", &json!({"product_id": mug.id, "quantity": 3}))
        .await;

    register(&mut ctx).await;

    let email = Email::parse(EMAIL).unwrap();
    let (customer, _) = ctx.store.get_customer_credentials(&email).await.unwrap().unwrap();
    let cart_id = customer.active_cart_id.unwrap();
    let cart = ctx.store.get_cart(cart_id).await.unwrap().unwrap();
    assert_eq!(cart.items.quantity(mug.id), 3);

    let mini = ctx.get("/api/cart/mini").await.json();
    assert_eq!(mini["quantity"], 3);
}

#[tokio::test]
async fn test_signed_on_cart_follows_the_customer() {
    let mut ctx = TestContext::new();
    let mug = ctx.product("Enamel Mug", Some("MUG-1"), Some(1000)).await;
    register(&mut ctx).await;
    ctx.post("/api/cart/add", &json!({"product_id": mug.id})).await;

    let mut laptop = ctx.fresh_client();
    let nonce = laptop.nonce("login").await;
    laptop
        .post(
            "/api/customers/sign-on",
            &json!({"email": EMAIL, "password": PASSWORD, "nonce": nonce}),
        )
        .await;

    let mini = laptop.get("/api/cart/mini").await.json();
    assert_eq!(mini["count"], 1);
}
