//! Payment processor integration.
//!
//! Handlers need two capabilities from the processor: open a payment intent
//! for an amount and hand its client secret to the browser, then look the
//! intent up again when the browser reports it paid. The [`PaymentProcessor`]
//! trait is that seam; [`StripeClient`] implements it against the Stripe REST
//! API.

pub mod client;
pub mod types;

use async_trait::async_trait;

pub use client::{StripeClient, StripeError};
pub use types::*;

/// Something that can open and look up payment intents.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Open a card payment intent for `amount_cents` in `currency`, tagged
    /// with the paying user's email.
    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        payer: &str,
    ) -> Result<PaymentIntent, StripeError>;

    /// Fetch the current state of an existing payment intent.
    async fn retrieve_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, StripeError>;
}
