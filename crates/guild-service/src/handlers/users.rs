//! User management handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use guild_core::{Email, ForumError, Role, User};
use guild_store::Store;

use crate::auth::{is_admin, AdminUser, AuthUser};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::handlers::Ack;
use crate::state::AppState;

/// Sign-up request.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Optional avatar URL.
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Sign-up response.
#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    /// Whether a new user was stored.
    pub inserted: bool,
    /// Present when the user already existed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Register a user on first sign-in. Repeating it is harmless.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<Json<CreateUserResponse>, ApiError> {
    let email = Email::parse(&body.email)?;
    let user = User::new(email, body.name.trim(), body.photo_url);

    let inserted = state
        .store_call("insert_user", move |store| store.insert_user_if_absent(&user))
        .await?;

    Ok(Json(CreateUserResponse {
        inserted,
        message: (!inserted).then(|| "user already exists".to_string()),
    }))
}

/// User lookup parameters.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    /// Look up a single user.
    pub email: Option<String>,
}

/// List all users (admin) or fetch one by `?email=` (any caller).
pub async fn get_users(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = query.email {
        let email = Email::parse(&raw)?;
        let lookup = email.clone();
        let user = state
            .store_call("get_user", move |store| store.get_user(&lookup))
            .await?
            .ok_or_else(|| ForumError::not_found("user", &email))?;
        return Ok(Json(user).into_response());
    }

    if !is_admin(&state, &auth.email).await? {
        return Err(ApiError::Forbidden(None));
    }

    let users = state
        .store_call("list_users", |store| store.list_users())
        .await?;
    Ok(Json(users).into_response())
}

/// Delete a user (admin).
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(email): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    let email = Email::parse(&email)?;

    let target = email.clone();
    state
        .store_call("delete_user", move |store| store.delete_user(&target))
        .await?;

    tracing::info!(email = %email, admin = %admin.user.email, "User deleted");
    Ok(Json(Ack::ok()))
}

/// Promote a user to admin (admin).
pub async fn make_admin(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(email): Path<String>,
) -> Result<Json<User>, ApiError> {
    let email = Email::parse(&email)?;

    let user = state
        .store_call("set_user_role", move |store| {
            store.set_user_role(&email, Role::Admin)
        })
        .await?;

    tracing::info!(email = %user.email, admin = %admin.user.email, "User promoted");
    Ok(Json(user))
}

/// Flag a user with a warning (admin).
pub async fn warn_user(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(email): Path<String>,
) -> Result<Json<User>, ApiError> {
    let email = Email::parse(&email)?;

    let user = state
        .store_call("warn_user", move |store| store.warn_user(&email))
        .await?;

    tracing::info!(email = %user.email, admin = %admin.user.email, "User warned");
    Ok(Json(user))
}
