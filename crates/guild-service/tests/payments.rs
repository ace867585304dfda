//! Payment integration tests.
//!
//! The payment processor is a local wiremock server standing in for the
//! Stripe REST API.

mod common;

use axum::http::StatusCode;
use common::{parse, TestHarness};
use guild_store::Store;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_intent(server: &MockServer, id: &str, status: &str, amount: i64, payer: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/payment_intents/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "amount": amount,
            "currency": "usd",
            "status": status,
            "metadata": { "payer": payer }
        })))
        .mount(server)
        .await;
}

fn harness_with_processor(server: &MockServer) -> TestHarness {
    let base_url = server.uri();
    TestHarness::with_config(move |config| {
        config.stripe_api_key = Some("sk_test_123".into());
        config.stripe_base_url = base_url;
    })
}

// ============================================================================
// Payment Intents
// ============================================================================

#[tokio::test]
async fn payment_intent_returns_client_secret() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payment_intents"))
        .and(header_exists("authorization"))
        .and(body_string_contains("amount=999"))
        .and(body_string_contains("currency=usd"))
        .and(body_string_contains("a%40x.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_123",
            "client_secret": "pi_123_secret_456",
            "amount": 999,
            "currency": "usd",
            "status": "requires_payment_method"
        })))
        .expect(1)
        .mount(&stripe)
        .await;

    let harness = harness_with_processor(&stripe);
    let (header, value) = harness.auth("a@x.com");

    let response = harness
        .server
        .post("/create-payment-intent")
        .add_header(header, value)
        .json(&json!({ "price": 9.99 }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["client_secret"], "pi_123_secret_456");
}

#[tokio::test]
async fn processor_errors_are_bad_gateway() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payment_intents"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": {
                "type": "card_error",
                "message": "Your card was declined.",
                "code": "card_declined"
            }
        })))
        .mount(&stripe)
        .await;

    let harness = harness_with_processor(&stripe);
    let (header, value) = harness.auth("a@x.com");

    let response = harness
        .server
        .post("/create-payment-intent")
        .add_header(header, value)
        .json(&json!({ "price": 5 }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "external_service_error"
    );
}

#[tokio::test]
async fn non_positive_price_never_reaches_processor() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payment_intents"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&stripe)
        .await;

    let harness = harness_with_processor(&stripe);
    let (header, value) = harness.auth("a@x.com");

    harness
        .server
        .post("/create-payment-intent")
        .add_header(header, value)
        .json(&json!({ "price": 0 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unconfigured_processor_is_bad_gateway() {
    let harness = TestHarness::new();
    let (header, value) = harness.auth("a@x.com");

    harness
        .server
        .post("/create-payment-intent")
        .add_header(header, value)
        .json(&json!({ "price": 5 }))
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
}

// ============================================================================
// Recorded Payments
// ============================================================================

#[tokio::test]
async fn recording_a_payment_grants_gold() {
    let stripe = MockServer::start().await;
    mount_intent(&stripe, "pi_123", "succeeded", 2000, "a@x.com").await;

    let harness = harness_with_processor(&stripe);
    harness.seed_user("a@x.com", "Alice");
    let (header, value) = harness.auth("a@x.com");

    let response = harness
        .server
        .post("/payments")
        .add_header(header.clone(), value.clone())
        .json(&json!({ "price": 20, "transaction_id": "pi_123" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["badge"], "gold");
    assert_eq!(body["payment"]["amount_cents"], 2000);

    let user = harness.store.get_user(&parse("a@x.com")).unwrap().unwrap();
    assert_eq!(user.badge, guild_core::Badge::Gold);

    let payments: Value = harness
        .server
        .get("/payments")
        .add_header(header, value)
        .await
        .json();
    assert_eq!(payments.as_array().unwrap().len(), 1);
    assert_eq!(payments[0]["transaction_id"], "pi_123");
}

#[tokio::test]
async fn unverified_transactions_grant_nothing() {
    let stripe = MockServer::start().await;
    mount_intent(&stripe, "pi_pending", "requires_payment_method", 2000, "a@x.com").await;
    mount_intent(&stripe, "pi_cheap", "succeeded", 100, "a@x.com").await;
    mount_intent(&stripe, "pi_bob", "succeeded", 2000, "b@x.com").await;
    Mock::given(method("GET"))
        .and(path("/payment_intents/pi_forged"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "type": "invalid_request_error",
                "message": "No such payment_intent: 'pi_forged'",
                "code": "resource_missing"
            }
        })))
        .mount(&stripe)
        .await;

    let harness = harness_with_processor(&stripe);
    harness.seed_user("a@x.com", "Alice");

    for (transaction_id, status) in [
        ("pi_pending", StatusCode::BAD_REQUEST),
        ("pi_cheap", StatusCode::BAD_REQUEST),
        ("pi_forged", StatusCode::BAD_REQUEST),
        ("pi_bob", StatusCode::FORBIDDEN),
        ("../customers", StatusCode::BAD_REQUEST),
    ] {
        let (header, value) = harness.auth("a@x.com");
        harness
            .server
            .post("/payments")
            .add_header(header, value)
            .json(&json!({ "price": 20, "transaction_id": transaction_id }))
            .await
            .assert_status(status);
    }

    let user = harness.store.get_user(&parse("a@x.com")).unwrap().unwrap();
    assert_ne!(user.badge, guild_core::Badge::Gold);
    assert!(harness
        .store
        .list_payments(Some(&parse("a@x.com")))
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn recording_without_processor_is_bad_gateway() {
    let harness = TestHarness::new();
    harness.seed_user("a@x.com", "Alice");
    let (header, value) = harness.auth("a@x.com");

    harness
        .server
        .post("/payments")
        .add_header(header, value)
        .json(&json!({ "price": 20, "transaction_id": "pi_123" }))
        .await
        .assert_status(StatusCode::BAD_GATEWAY);

    let user = harness.store.get_user(&parse("a@x.com")).unwrap().unwrap();
    assert_ne!(user.badge, guild_core::Badge::Gold);
}

#[tokio::test]
async fn payment_for_unknown_user_is_not_found() {
    let stripe = MockServer::start().await;
    mount_intent(&stripe, "pi_123", "succeeded", 2000, "ghost@x.com").await;

    let harness = harness_with_processor(&stripe);
    let (header, value) = harness.auth("ghost@x.com");

    harness
        .server
        .post("/payments")
        .add_header(header, value)
        .json(&json!({ "price": 20, "transaction_id": "pi_123" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    assert!(harness
        .store
        .list_payments(Some(&parse("ghost@x.com")))
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn other_users_payments_need_admin() {
    let harness = TestHarness::new();
    harness.seed_user("a@x.com", "Alice");
    harness.seed_admin("mod@x.com");

    let (header, value) = harness.auth("b@x.com");
    harness
        .server
        .get("/payments")
        .add_query_param("email", "a@x.com")
        .add_header(header, value)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let (header, value) = harness.auth("mod@x.com");
    harness
        .server
        .get("/payments")
        .add_query_param("email", "a@x.com")
        .add_header(header, value)
        .await
        .assert_status_ok();
}
