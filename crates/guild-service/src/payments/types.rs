//! Stripe API types.

use std::collections::HashMap;

use serde::Deserialize;

/// Stripe `PaymentIntent` object.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    /// Payment intent ID.
    pub id: String,
    /// Secret the browser uses to confirm the intent.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Amount in cents.
    #[serde(default)]
    pub amount: i64,
    /// Currency (e.g., "usd").
    #[serde(default)]
    pub currency: String,
    /// Status (`requires_payment_method`, succeeded, ...).
    #[serde(default)]
    pub status: String,
    /// Key-value pairs attached when the intent was opened.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    /// Metadata key holding the email of the user the intent was opened for.
    pub const PAYER_KEY: &'static str = "payer";

    /// Whether the processor has captured the funds.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }

    /// The email the intent was opened for, if any.
    #[must_use]
    pub fn payer(&self) -> Option<&str> {
        self.metadata.get(Self::PAYER_KEY).map(String::as_str)
    }
}

/// Stripe API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
}
