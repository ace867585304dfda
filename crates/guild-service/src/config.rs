//! Service configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Signing secret used when `ACCESS_TOKEN_SECRET` is unset. Development only.
pub const DEV_TOKEN_SECRET: &str = "guild-dev-secret-change-me";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:5000").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/guild").
    pub data_dir: String,

    /// HS256 secret for session tokens.
    pub access_token_secret: String,

    /// Session token lifetime in hours (default: 24).
    pub token_ttl_hours: i64,

    /// Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Upper bound on a single store call, retries included.
    pub store_timeout_ms: u64,

    /// Attempts made for a store call failing with a transient error.
    pub store_retry_attempts: u32,

    /// Delay before the first retry; doubles on each further attempt.
    pub store_retry_backoff_ms: u64,

    /// Stripe API key (optional).
    pub stripe_api_key: Option<String>,

    /// Stripe API base URL (overridable for tests).
    pub stripe_base_url: String,
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    api_key: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let access_token_secret = std::env::var("ACCESS_TOKEN_SECRET").unwrap_or_else(|_| {
            tracing::warn!("ACCESS_TOKEN_SECRET not set - using the development secret");
            defaults.access_token_secret.clone()
        });

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            access_token_secret,
            token_ttl_hours: env_parse("TOKEN_TTL_HOURS").unwrap_or(defaults.token_ttl_hours),
            cookie_secure: env_parse("COOKIE_SECURE").unwrap_or(defaults.cookie_secure),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or(defaults.cors_origins),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
            store_timeout_ms: env_parse("STORE_TIMEOUT_MS").unwrap_or(defaults.store_timeout_ms),
            store_retry_attempts: env_parse("STORE_RETRY_ATTEMPTS")
                .unwrap_or(defaults.store_retry_attempts),
            store_retry_backoff_ms: env_parse("STORE_RETRY_BACKOFF_MS")
                .unwrap_or(defaults.store_retry_backoff_ms),
            stripe_api_key: load_stripe_secrets(),
            stripe_base_url: std::env::var("STRIPE_BASE_URL").unwrap_or(defaults.stripe_base_url),
        }
    }

    /// Bound on one store call.
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Delay before the first store retry.
    #[must_use]
    pub const fn store_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.store_retry_backoff_ms)
    }

    /// Whether the signing secret is the built-in development value.
    #[must_use]
    pub fn uses_dev_secret(&self) -> bool {
        self.access_token_secret == DEV_TOKEN_SECRET
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Load the Stripe key from file or environment.
fn load_stripe_secrets() -> Option<String> {
    let secret_paths = [".secrets/stripe.json", "../.secrets/stripe.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return Some(secrets.api_key);
        }
    }

    // Fall back to environment variables
    tracing::debug!("Stripe secrets file not found, using environment variables");
    std::env::var("STRIPE_API_KEY").ok()
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".into(),
            data_dir: "/data/guild".into(),
            access_token_secret: DEV_TOKEN_SECRET.into(),
            token_ttl_hours: 24,
            cookie_secure: false,
            cors_origins: vec!["http://localhost:5173".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            store_timeout_ms: 5000,
            store_retry_attempts: 3,
            store_retry_backoff_ms: 25,
            stripe_api_key: None,
            stripe_base_url: "https://api.stripe.com/v1".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServiceConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:5000");
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.store_timeout(), Duration::from_secs(5));
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn origins_are_trimmed() {
        assert_eq!(
            parse_origins(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn missing_secrets_file_is_not_found() {
        let err = load_secrets_file::<StripeSecrets>("/nonexistent/stripe.json").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
