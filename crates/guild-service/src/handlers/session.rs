//! Session issuance.
//!
//! Sign-in itself happens at the identity provider; the client then trades
//! the verified email for a session cookie here.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use serde::Deserialize;

use guild_core::Email;

use crate::auth::{clear_session_cookie, issue_token, session_cookie};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::handlers::Ack;
use crate::state::AppState;

/// Session request.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    /// Email verified by the identity provider.
    pub email: String,
}

/// Issue a session cookie.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = Email::parse(&body.email)?;
    let token = issue_token(&state.config, &email)?;

    tracing::info!(email = %email, "Session issued");

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&state.config, &token))]),
        Json(Ack::ok()),
    ))
}

/// Clear the session cookie.
pub async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie(&state.config))]),
        Json(Ack::ok()),
    )
}
