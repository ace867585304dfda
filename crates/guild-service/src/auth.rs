//! Session tokens and authentication extractors.
//!
//! This module provides:
//! - `issue_token` / `verify_token` - HS256 session tokens carrying an email
//! - `AuthUser` - any caller holding a valid session
//! - `AdminUser` - a caller whose stored role is `Admin`
//!
//! The token travels in the `token` cookie (HTTP-only, `SameSite=Strict`);
//! an `Authorization: Bearer` header is accepted as a fallback for
//! non-browser clients.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use guild_core::{Email, User};
use guild_store::Store;

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The user's email.
    pub email: String,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
}

/// Sign a session token for `email`.
///
/// # Errors
///
/// Returns `ApiError::Internal` if signing fails.
pub fn issue_token(config: &ServiceConfig, email: &Email) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        email: email.as_str().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.token_ttl_hours)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.access_token_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

/// Verify a session token and return the email it carries.
///
/// # Errors
///
/// Returns `ApiError::InvalidCredentials` for a bad signature, an expired
/// token, or a malformed email claim.
pub fn verify_token(config: &ServiceConfig, token: &str) -> Result<Email, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.access_token_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Session token rejected");
        ApiError::InvalidCredentials
    })?;

    Email::parse(&data.claims.email).map_err(|_| ApiError::InvalidCredentials)
}

/// `Set-Cookie` value carrying a fresh session token.
#[must_use]
pub fn session_cookie(config: &ServiceConfig, token: &str) -> String {
    let max_age = config.token_ttl_hours * 3600;
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Strict; Max-Age={max_age}");
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie.
#[must_use]
pub fn clear_session_cookie(config: &ServiceConfig) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Strict; Max-Age=0");
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Pull the raw token from the session cookie or a bearer header.
fn token_from_parts(parts: &Parts) -> Option<&str> {
    let from_cookie = parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty());

    from_cookie.or_else(|| {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    })
}

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The caller's email, taken from the verified token.
    pub email: Email,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or(ApiError::MissingCredentials)?;
        let email = verify_token(&state.config, token)?;
        Ok(Self { email })
    }
}

/// An authenticated caller whose stored role is `Admin`.
#[derive(Debug, Clone)]
pub struct AdminUser {
    /// The admin's user record.
    pub user: User,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser { email } = AuthUser::from_request_parts(parts, state).await?;

        let lookup = email.clone();
        let user = state
            .store_call("get_user", move |store| store.get_user(&lookup))
            .await?;

        match user {
            Some(user) if user.is_admin() => Ok(Self { user }),
            _ => {
                tracing::debug!(email = %email, "Admin route refused");
                Err(ApiError::Forbidden(None))
            }
        }
    }
}

/// Whether `caller` is an admin, for routes open to owners and admins alike.
///
/// # Errors
///
/// Propagates store failures.
pub async fn is_admin(state: &AppState, caller: &Email) -> Result<bool, ApiError> {
    let lookup = caller.clone();
    let user = state
        .store_call("get_user", move |store| store.get_user(&lookup))
        .await?;
    Ok(user.is_some_and(|u| u.is_admin()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    #[test]
    fn token_round_trip() {
        let config = ServiceConfig::default();
        let token = issue_token(&config, &email("Alice@X.com")).unwrap();
        assert_eq!(verify_token(&config, &token).unwrap(), email("alice@x.com"));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let config = ServiceConfig::default();
        let token = issue_token(&config, &email("alice@x.com")).unwrap();

        let other = ServiceConfig {
            access_token_secret: "another-secret".into(),
            ..ServiceConfig::default()
        };
        assert!(matches!(
            verify_token(&other, &token),
            Err(ApiError::InvalidCredentials)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = ServiceConfig {
            token_ttl_hours: -1,
            ..ServiceConfig::default()
        };
        let token = issue_token(&config, &email("alice@x.com")).unwrap();
        assert!(matches!(
            verify_token(&config, &token),
            Err(ApiError::InvalidCredentials)
        ));
    }

    #[test]
    fn cookie_attributes() {
        let config = ServiceConfig {
            cookie_secure: true,
            ..ServiceConfig::default()
        };
        let cookie = session_cookie(&config, "abc");
        assert!(cookie.starts_with("token=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.ends_with("; Secure"));
        assert!(clear_session_cookie(&config).contains("Max-Age=0"));
    }

    #[test]
    fn cookie_wins_over_bearer() {
        let request = axum::http::Request::builder()
            .header(COOKIE, "theme=dark; token=from-cookie")
            .header(AUTHORIZATION, "Bearer from-header")
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();
        assert_eq!(token_from_parts(&parts), Some("from-cookie"));

        let request = axum::http::Request::builder()
            .header(AUTHORIZATION, "Bearer from-header")
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();
        assert_eq!(token_from_parts(&parts), Some("from-header"));
    }
}
