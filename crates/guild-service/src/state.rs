//! Application state.

use std::sync::Arc;

use guild_store::RocksStore;

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::payments::{PaymentProcessor, StripeClient};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Payment processor for payment intents (optional).
    pub payments: Option<Arc<dyn PaymentProcessor>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let payments = config.stripe_api_key.as_ref().and_then(|key| {
            match StripeClient::new(key, &config.stripe_base_url) {
                Ok(client) => {
                    tracing::info!("Stripe integration enabled");
                    Some(Arc::new(client) as Arc<dyn PaymentProcessor>)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Stripe client");
                    None
                }
            }
        });

        if payments.is_none() {
            tracing::warn!("Stripe not configured - payment intents will not be available");
        }

        Self {
            store,
            config,
            payments,
        }
    }

    /// Run a blocking store call off the async runtime.
    ///
    /// Transient failures are retried with exponential backoff up to
    /// `store_retry_attempts` times; the whole sequence is bounded by
    /// `store_timeout_ms` and fails with [`ApiError::Timeout`] past it.
    pub async fn store_call<T, F>(&self, op: &'static str, call: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: Fn(&RocksStore) -> guild_store::Result<T> + Send + Sync + 'static,
    {
        let call = Arc::new(call);
        let attempts = self.config.store_retry_attempts.max(1);
        let mut backoff = self.config.store_retry_backoff();

        let run = async {
            let mut attempt = 1;
            loop {
                let store = Arc::clone(&self.store);
                let call = Arc::clone(&call);
                let result = tokio::task::spawn_blocking(move || call(&store))
                    .await
                    .map_err(|e| ApiError::Internal(format!("store task failed: {e}")))?;

                match result {
                    Err(err) if err.is_transient() && attempt < attempts => {
                        tracing::warn!(op, attempt, error = %err, "Transient store error, retrying");
                        tokio::time::sleep(backoff).await;
                        backoff = backoff.saturating_mul(2);
                        attempt += 1;
                    }
                    other => return other.map_err(ApiError::from),
                }
            }
        };

        tokio::time::timeout(self.config.store_timeout(), run)
            .await
            .map_err(|_| {
                tracing::warn!(op, "Store call timed out");
                ApiError::Timeout
            })?
    }
}
