//! Payment handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use guild_core::{Badge, Email, Payment};
use guild_store::Store;

use crate::auth::{is_admin, AuthUser};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::payments::{PaymentIntent, PaymentProcessor, StripeError};
use crate::state::AppState;

/// Currency every payment intent is opened in.
const CURRENCY: &str = "usd";

/// Convert a dollar price to whole cents.
#[allow(clippy::cast_possible_truncation)]
fn price_to_cents(price: f64) -> Result<i64, ApiError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(ApiError::BadRequest("price must be a positive amount".into()));
    }

    let cents = (price * 100.0).round();
    if cents < 1.0 || cents > 1e12 {
        return Err(ApiError::BadRequest("price is out of range".into()));
    }

    Ok(cents as i64)
}

fn payment_processor(state: &AppState) -> Result<&dyn PaymentProcessor, ApiError> {
    state
        .payments
        .as_deref()
        .ok_or_else(|| ApiError::ExternalService("payments are not configured".into()))
}

/// Check that `intent` is a captured payment of `amount_cents` by `payer`.
fn verify_intent(intent: &PaymentIntent, amount_cents: i64, payer: &Email) -> Result<(), ApiError> {
    if !intent.succeeded() {
        return Err(ApiError::BadRequest(format!(
            "payment {} has not succeeded (status {})",
            intent.id, intent.status
        )));
    }
    if intent.amount != amount_cents || !intent.currency.eq_ignore_ascii_case(CURRENCY) {
        return Err(ApiError::BadRequest(format!(
            "payment {} does not match the reported price",
            intent.id
        )));
    }
    if intent.payer() != Some(payer.as_str()) {
        return Err(ApiError::Forbidden(Some(format!(
            "payment {} belongs to another user",
            intent.id
        ))));
    }
    Ok(())
}

/// Payment intent request.
#[derive(Debug, Deserialize)]
pub struct PaymentIntentRequest {
    /// Price in dollars.
    pub price: f64,
}

/// Payment intent response.
#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    /// Secret the browser confirms the payment with.
    pub client_secret: String,
}

/// Open a card payment intent with the payment processor.
pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    let amount_cents = price_to_cents(body.price)?;

    let processor = payment_processor(&state)?;

    let intent = processor
        .create_payment_intent(amount_cents, CURRENCY, auth.email.as_str())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, email = %auth.email, "Payment intent failed");
            ApiError::ExternalService(e.to_string())
        })?;

    tracing::info!(intent_id = %intent.id, amount_cents, email = %auth.email, "Payment intent created");

    let client_secret = intent.client_secret.ok_or_else(|| {
        ApiError::ExternalService("payment intent has no client secret".into())
    })?;

    Ok(Json(PaymentIntentResponse { client_secret }))
}

/// Completed payment report from the browser.
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    /// Price in dollars.
    pub price: f64,
    /// Processor transaction reference.
    pub transaction_id: String,
}

/// Recorded payment plus the payer's resulting badge.
#[derive(Debug, Serialize)]
pub struct RecordPaymentResponse {
    /// The stored payment.
    pub payment: Payment,
    /// Badge after the payment.
    pub badge: Badge,
}

/// Record a completed payment and grant the gold badge.
///
/// The transaction is looked up with the processor first; only a succeeded
/// intent for the reported price, opened by the caller, is recorded.
pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<RecordPaymentRequest>,
) -> Result<Json<RecordPaymentResponse>, ApiError> {
    let amount_cents = price_to_cents(body.price)?;
    let transaction_id = body.transaction_id.trim();
    if transaction_id.is_empty() {
        return Err(ApiError::BadRequest("transaction_id is required".into()));
    }
    if !transaction_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ApiError::BadRequest("transaction_id is malformed".into()));
    }

    let intent = payment_processor(&state)?
        .retrieve_payment_intent(transaction_id)
        .await
        .map_err(|e| match e {
            StripeError::Api {
                code: Some(ref code),
                ..
            } if code == "resource_missing" => {
                ApiError::BadRequest(format!("unknown transaction {transaction_id}"))
            }
            e => {
                tracing::warn!(error = %e, email = %auth.email, "Payment lookup failed");
                ApiError::ExternalService(e.to_string())
            }
        })?;
    verify_intent(&intent, amount_cents, &auth.email)?;

    let payment = Payment::new(auth.email, amount_cents, transaction_id);

    let stored = payment.clone();
    let user = state
        .store_call("record_payment", move |store| store.record_payment(&stored))
        .await?;

    Ok(Json(RecordPaymentResponse {
        payment,
        badge: user.badge,
    }))
}

/// Payment listing parameters.
#[derive(Debug, Deserialize)]
pub struct PaymentsQuery {
    /// Whose payments to list; defaults to the caller.
    pub email: Option<String>,
}

/// List the caller's payments, or anyone's for an admin.
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiQuery(params): ApiQuery<PaymentsQuery>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let email = match params.email.as_deref() {
        Some(raw) => Email::parse(raw)?,
        None => auth.email.clone(),
    };

    if email != auth.email && !is_admin(&state, &auth.email).await? {
        return Err(ApiError::Forbidden(Some(
            "only admins can list other users' payments".into(),
        )));
    }

    let payments = state
        .store_call("list_payments", move |store| store.list_payments(Some(&email)))
        .await?;

    Ok(Json(payments))
}
