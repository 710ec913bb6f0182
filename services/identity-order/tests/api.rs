//! End-to-end tests for the HTTP surface
//!
//! The router runs against in-memory stores, a recording mailer (so
//! tests can read the verification codes that would have been
//! emailed), and a canned payment processor.

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use identity_order::config::Config;
use identity_order::email::{MailError, Mailer};
use identity_order::payment::{PaymentError, PaymentIntent, PaymentProcessor};
use identity_order::router::create_router;
use identity_order::state::AppState;
use identity_order::store::{CredentialStore, MemoryCredentialStore, MemoryOrderStore, OrderStore};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use types::ids::ProductId;

/// Captures outbound verification codes instead of sending them
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    fn code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification(&self, to: &str, code: &str) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), code.to_string()));
        Ok(())
    }
}

/// Mailer that always fails; registration must still succeed
struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_verification(&self, _to: &str, _code: &str) -> Result<(), MailError> {
        Err(MailError::Transport("connection refused".to_string()))
    }
}

struct StaticPaymentProcessor;

#[async_trait]
impl PaymentProcessor for StaticPaymentProcessor {
    async fn create_intent(
        &self,
        _amount: Decimal,
        order_id: &types::ids::OrderId,
    ) -> Result<PaymentIntent, PaymentError> {
        Ok(PaymentIntent {
            id: format!("pi_{order_id}"),
            client_secret: "cs_test_secret".to_string(),
        })
    }
}

fn test_app_with_mailer(mailer: Arc<dyn Mailer>) -> Router {
    let config = Config {
        jwt_secret: "integration-secret".to_string(),
        ..Config::default()
    };
    let credentials: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
    let orders: Arc<dyn OrderStore> = Arc::new(MemoryOrderStore::new());
    let state = AppState::new(
        config,
        credentials,
        orders,
        mailer,
        Arc::new(StaticPaymentProcessor),
    );
    create_router(state)
}

fn test_app() -> (Router, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    (test_app_with_mailer(mailer.clone()), mailer)
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn register_body(email: &str, username: &str) -> Value {
    json!({
        "username": username,
        "password": "hunter2!secret",
        "csufEmail": email,
        "fullName": "Tuffy Titan",
    })
}

async fn register(app: &Router, email: &str, username: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(register_body(email, username)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body
}

async fn login(app: &Router, identifier: &str) -> (Value, String) {
    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"identifier": identifier, "password": "hunter2!secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    let token = body["token"].as_str().unwrap().to_string();
    (body["user"].clone(), token)
}

fn cart() -> Value {
    json!([
        {"productId": ProductId::new(), "title": "Physics Textbook", "unitPrice": "45.00", "quantity": 1},
        {"productId": ProductId::new(), "title": "Desk Lamp", "unitPrice": "25.00", "quantity": 2},
    ])
}

async fn create_order(app: &Router, buyer_token: &str, seller_id: &Value) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/orders",
        Some(buyer_token),
        Some(json!({"sellerId": seller_id, "items": cart()})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "order create failed: {body}");
    body
}

#[tokio::test]
async fn register_returns_account_without_secrets() {
    let (app, mailer) = test_app();
    let body = register(&app, "Tuffy@CSU.Fullerton.EDU", "Tuffy_Titan").await;

    // Email and handle come back normalized; secrets never leave.
    assert_eq!(body["csufEmail"], "tuffy@csu.fullerton.edu");
    assert_eq!(body["username"], "tuffy_titan");
    assert_eq!(body["isEmailVerified"], false);
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("verificationCode").is_none());

    let code = mailer.code_for("tuffy@csu.fullerton.edu").unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn register_rejects_foreign_domain() {
    let (app, _) = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(register_body("tuffy@gmail.com", "tuffy")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION");
}

#[tokio::test]
async fn register_rejects_bad_handle() {
    let (app, _) = test_app();
    for bad in ["ab", "way_too_long_for_a_handle", "has space", "bang!"] {
        let (status, _) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(register_body("tuffy@csu.fullerton.edu", bad)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "handle {bad:?} must be rejected");
    }
}

#[tokio::test]
async fn register_rejects_missing_fields() {
    let (app, _) = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"username": "tuffy", "csufEmail": "tuffy@csu.fullerton.edu"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (app, _) = test_app();
    register(&app, "tuffy@csu.fullerton.edu", "tuffy").await;

    // Same email, different case, different handle.
    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(register_body("TUFFY@csu.fullerton.edu", "other")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CONFLICT");

    // Fresh email, taken handle.
    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(register_body("elphie@csu.fullerton.edu", "tuffy")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn email_failure_does_not_fail_registration() {
    let app = test_app_with_mailer(Arc::new(FailingMailer));
    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(register_body("tuffy@csu.fullerton.edu", "tuffy")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn verify_email_is_single_use() {
    let (app, mailer) = test_app();
    register(&app, "tuffy@csu.fullerton.edu", "tuffy").await;
    let code = mailer.code_for("tuffy@csu.fullerton.edu").unwrap();

    // Wrong code first; state stays unverified.
    let (status, body) = send(
        &app,
        "POST",
        "/auth/verify-email",
        None,
        Some(json!({"csufEmail": "tuffy@csu.fullerton.edu", "code": "000000"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    // Correct code flips the flag.
    let (status, body) = send(
        &app,
        "POST",
        "/auth/verify-email",
        None,
        Some(json!({"csufEmail": "tuffy@csu.fullerton.edu", "code": code})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isEmailVerified"], true);
    assert!(body.get("verificationCode").is_none());

    // Replaying the same code fails: already verified.
    let (status, body) = send(
        &app,
        "POST",
        "/auth/verify-email",
        None,
        Some(json!({"csufEmail": "tuffy@csu.fullerton.edu", "code": code})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already verified");
}

#[tokio::test]
async fn verify_email_unknown_user_is_404() {
    let (app, _) = test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/auth/verify-email",
        None,
        Some(json!({"csufEmail": "ghost@csu.fullerton.edu", "code": "123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let (app, _) = test_app();
    register(&app, "tuffy@csu.fullerton.edu", "tuffy").await;

    let (status_a, body_a) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"identifier": "tuffy", "password": "wrong-password"})),
    )
    .await;
    let (status_b, body_b) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"identifier": "nobody", "password": "hunter2!secret"})),
    )
    .await;

    assert_eq!(status_a, StatusCode::UNAUTHORIZED);
    assert_eq!(status_b, StatusCode::UNAUTHORIZED);
    // Identical payloads: no way to tell which part was wrong.
    assert_eq!(body_a, body_b);
}

#[tokio::test]
async fn login_token_grants_access() {
    let (app, _) = test_app();
    let account = register(&app, "tuffy@csu.fullerton.edu", "tuffy").await;
    let (user, token) = login(&app, "tuffy").await;
    assert_eq!(user["userId"], account["userId"]);

    let path = format!("/orders/user/{}", user["userId"].as_str().unwrap());
    let (status, body) = send(&app, "GET", &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    // No token, garbage token: both 401.
    let (status, _) = send(&app, "GET", &path, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, "GET", &path, Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn repeated_login_attempts_are_rate_limited() {
    let (app, _) = test_app();
    let mut last_status = StatusCode::OK;
    for _ in 0..12 {
        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"identifier": "guessing", "password": "x"})),
        )
        .await;
        last_status = status;
    }
    assert_eq!(last_status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn order_total_matches_cart_snapshot() {
    let (app, _) = test_app();
    register(&app, "buyer@csu.fullerton.edu", "buyer").await;
    let seller = register(&app, "seller@csu.fullerton.edu", "seller").await;
    let (_, buyer_token) = login(&app, "buyer").await;

    let order = create_order(&app, &buyer_token, &seller["userId"]).await;
    assert_eq!(
        Decimal::from_str(order["totalAmount"].as_str().unwrap()).unwrap(),
        Decimal::from_str("95.00").unwrap()
    );
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["buyerName"], "Tuffy Titan");
    assert!(order["paymentIntentId"].is_null());
}

#[tokio::test]
async fn order_create_rejects_bad_carts() {
    let (app, _) = test_app();
    register(&app, "buyer@csu.fullerton.edu", "buyer").await;
    let seller = register(&app, "seller@csu.fullerton.edu", "seller").await;
    let (_, token) = login(&app, "buyer").await;

    for items in [
        json!([]),
        json!([{"productId": ProductId::new(), "title": "Free", "unitPrice": "0.00", "quantity": 1}]),
        json!([{"productId": ProductId::new(), "title": "None", "unitPrice": "5.00", "quantity": 0}]),
    ] {
        let (status, _) = send(
            &app,
            "POST",
            "/orders",
            Some(&token),
            Some(json!({"sellerId": seller["userId"], "items": items})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn full_order_lifecycle() {
    let (app, _) = test_app();
    register(&app, "buyer@csu.fullerton.edu", "buyer").await;
    register(&app, "seller@csu.fullerton.edu", "seller").await;
    let (_, buyer_token) = login(&app, "buyer").await;
    let (seller_user, seller_token) = login(&app, "seller").await;

    let order = create_order(&app, &buyer_token, &seller_user["userId"]).await;
    let order_id = order["id"].as_str().unwrap().to_string();

    // Buyer starts payment; order moves to PaymentProcessing.
    let (status, body) = send(
        &app,
        "POST",
        "/payment/create-intent",
        Some(&buyer_token),
        Some(json!({"orderId": order_id, "amount": "95.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["clientSecret"], "cs_test_secret");

    let status_path = format!("/orders/{order_id}/status");
    let (status, body) = send(
        &app,
        "POST",
        &status_path,
        Some(&seller_token),
        Some(json!({"status": "Confirmed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Confirmed");
    assert!(body["paymentIntentId"].as_str().unwrap().starts_with("pi_"));

    // Either party schedules the meeting.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/orders/{order_id}/meeting"),
        Some(&buyer_token),
        Some(json!({"location": "Pollak Library", "time": "2025-11-01T15:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Meeting Scheduled");
    assert_eq!(body["meetingLocation"], "Pollak Library");

    let (status, body) = send(
        &app,
        "POST",
        &status_path,
        Some(&buyer_token),
        Some(json!({"status": "Completed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Completed");

    // Terminal state: every further move is a conflict.
    for target in ["Cancelled", "Confirmed", "Pending"] {
        let (status, body) = send(
            &app,
            "POST",
            &status_path,
            Some(&buyer_token),
            Some(json!({"status": target})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT, "{target}: {body}");
        assert_eq!(body["error"], "CONFLICT");
    }
}

#[tokio::test]
async fn skipping_states_is_a_conflict() {
    let (app, _) = test_app();
    register(&app, "buyer@csu.fullerton.edu", "buyer").await;
    let seller = register(&app, "seller@csu.fullerton.edu", "seller").await;
    let (_, token) = login(&app, "buyer").await;
    let order = create_order(&app, &token, &seller["userId"]).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/orders/{}/status", order["id"].as_str().unwrap()),
        Some(&token),
        Some(json!({"status": "Completed"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancel_works_from_pending() {
    let (app, _) = test_app();
    register(&app, "buyer@csu.fullerton.edu", "buyer").await;
    let seller = register(&app, "seller@csu.fullerton.edu", "seller").await;
    let (_, token) = login(&app, "buyer").await;
    let order = create_order(&app, &token, &seller["userId"]).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/orders/{}/status", order["id"].as_str().unwrap()),
        Some(&token),
        Some(json!({"status": "Cancelled"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Cancelled");
}

#[tokio::test]
async fn payment_intent_guards() {
    let (app, _) = test_app();
    register(&app, "buyer@csu.fullerton.edu", "buyer").await;
    register(&app, "seller@csu.fullerton.edu", "seller").await;
    let (_, buyer_token) = login(&app, "buyer").await;
    let (seller_user, seller_token) = login(&app, "seller").await;
    let order = create_order(&app, &buyer_token, &seller_user["userId"]).await;
    let order_id = order["id"].as_str().unwrap();

    // Wrong amount.
    let (status, _) = send(
        &app,
        "POST",
        "/payment/create-intent",
        Some(&buyer_token),
        Some(json!({"orderId": order_id, "amount": "10.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Only the buyer can start payment.
    let (status, _) = send(
        &app,
        "POST",
        "/payment/create-intent",
        Some(&seller_token),
        Some(json!({"orderId": order_id, "amount": "95.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Happy path, then a second intent is a transition conflict.
    let (status, _) = send(
        &app,
        "POST",
        "/payment/create-intent",
        Some(&buyer_token),
        Some(json!({"orderId": order_id, "amount": "95.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        "POST",
        "/payment/create-intent",
        Some(&buyer_token),
        Some(json!({"orderId": order_id, "amount": "95.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn order_listing_covers_both_roles_and_is_private() {
    let (app, _) = test_app();
    register(&app, "buyer@csu.fullerton.edu", "buyer").await;
    register(&app, "seller@csu.fullerton.edu", "seller").await;
    let (buyer_user, buyer_token) = login(&app, "buyer").await;
    let (seller_user, seller_token) = login(&app, "seller").await;

    // One order each way between the two users.
    create_order(&app, &buyer_token, &seller_user["userId"]).await;
    create_order(&app, &seller_token, &buyer_user["userId"]).await;

    let path = format!("/orders/user/{}", buyer_user["userId"].as_str().unwrap());
    let (status, body) = send(&app, "GET", &path, Some(&buyer_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    // Newest first.
    let first = types::timestamp::parse(orders[0]["createdAt"].as_str().unwrap()).unwrap();
    let second = types::timestamp::parse(orders[1]["createdAt"].as_str().unwrap()).unwrap();
    assert!(first >= second);

    // Another user's listing is off limits.
    let (status, _) = send(&app, "GET", &path, Some(&seller_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_order_is_404() {
    let (app, _) = test_app();
    register(&app, "buyer@csu.fullerton.edu", "buyer").await;
    let (_, token) = login(&app, "buyer").await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/orders/{}/status", types::ids::OrderId::new()),
        Some(&token),
        Some(json!({"status": "Cancelled"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
