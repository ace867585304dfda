//! Friend request handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use guild_core::{Email, FriendRequest, FriendRequestId, FriendStatus};
use guild_store::Store;

use crate::auth::{is_admin, AuthUser};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Friend request creation body.
#[derive(Debug, Deserialize)]
pub struct SendFriendRequest {
    /// Recipient email.
    pub to: String,
}

/// Send a friend request from the caller.
pub async fn send_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<SendFriendRequest>,
) -> Result<Json<FriendRequest>, ApiError> {
    let to = Email::parse(&body.to)?;
    let request = FriendRequest::new(auth.email, to)?;

    let stored = request.clone();
    state
        .store_call("create_friend_request", move |store| {
            store.create_friend_request(&stored)
        })
        .await?;

    Ok(Json(request))
}

/// Pending requests addressed to the caller.
pub async fn incoming_requests(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<FriendRequest>>, ApiError> {
    let email = auth.email;
    let requests = state
        .store_call("incoming_friend_requests", move |store| {
            store.incoming_friend_requests(&email, Some(FriendStatus::Pending))
        })
        .await?;

    Ok(Json(requests))
}

/// Friend request answer.
#[derive(Debug, Deserialize)]
pub struct RespondFriendRequest {
    /// `accept` or `reject`.
    pub status: String,
}

/// Accept or reject a request addressed to the caller.
pub async fn respond_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RespondFriendRequest>,
) -> Result<Json<FriendRequest>, ApiError> {
    let request_id: FriendRequestId = id.parse()?;
    let status: FriendStatus = body.status.parse()?;

    let responder = auth.email;
    let request = state
        .store_call("respond_friend_request", move |store| {
            store.respond_friend_request(&request_id, &responder, status)
        })
        .await?;

    Ok(Json(request))
}

/// One accepted friendship, seen from one side.
#[derive(Debug, Serialize)]
pub struct Friend {
    /// The underlying relation.
    pub request_id: FriendRequestId,
    /// The other party.
    pub friend: Email,
    /// When the relation was accepted.
    pub since: Option<DateTime<Utc>>,
}

/// Accepted friends of `email` (that user or an admin).
pub async fn my_friends(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(email): Path<String>,
) -> Result<Json<Vec<Friend>>, ApiError> {
    let email = Email::parse(&email)?;
    if email != auth.email && !is_admin(&state, &auth.email).await? {
        return Err(ApiError::Forbidden(Some(
            "friend lists are private to their owner".into(),
        )));
    }

    let lookup = email.clone();
    let relations = state
        .store_call("friends_of", move |store| store.friends_of(&lookup))
        .await?;

    let friends: Vec<Friend> = relations
        .iter()
        .filter_map(|relation| {
            relation.other_party(&email).map(|friend| Friend {
                request_id: relation.id,
                friend: friend.clone(),
                since: relation.responded_at,
            })
        })
        .collect();

    Ok(Json(friends))
}
