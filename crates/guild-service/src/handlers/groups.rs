//! Group membership handlers.
//!
//! Every mutation goes through one store call that loads the group, applies
//! the rule from `guild_core::Group`, and commits the result atomically, so
//! permission checks (owner only) happen under the same lock as the write.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use guild_core::{
    Email, ForumError, Group, GroupId, GroupRole, GroupRoster, JoinAction, TextFilter, Window,
};
use guild_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::handlers::{Ack, ListResponse};
use crate::state::AppState;

/// Group creation request.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    /// Group name, unique case-insensitively.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Create a group owned by the caller.
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<CreateGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let group = Group::new(&body.name, body.description, auth.email, Utc::now())?;

    let stored = group.clone();
    state
        .store_call("create_group", move |store| store.create_group(&stored))
        .await?;

    Ok(Json(group))
}

/// Group listing parameters.
#[derive(Debug, Deserialize)]
pub struct ListGroupsQuery {
    /// Case-insensitive name substring.
    pub search: Option<String>,
    /// First N results; wins over `page`/`size`.
    pub limit: Option<usize>,
    /// Zero-based page number.
    pub page: Option<usize>,
    /// Results per page.
    pub size: Option<usize>,
}

/// List groups, newest first.
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListGroupsQuery>,
) -> Result<Json<ListResponse<Group>>, ApiError> {
    let name = TextFilter::parse(params.search.as_deref());
    let window = Window::from_params(params.limit, params.page, params.size);

    let page = state
        .store_call("list_groups", move |store| {
            store.list_groups(name.as_ref(), window)
        })
        .await?;

    Ok(Json(ListResponse::from_page(page, window)))
}

async fn load_group(state: &AppState, group_id: GroupId) -> Result<Group, ApiError> {
    let group = state
        .store_call("get_group", move |store| store.get_group(&group_id))
        .await?
        .ok_or_else(|| ForumError::not_found("group", group_id))?;
    Ok(group)
}

/// Fetch a single group.
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group_id: GroupId = id.parse()?;
    Ok(Json(load_group(&state, group_id).await?))
}

/// File a join request for the caller.
pub async fn submit_join_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group_id: GroupId = id.parse()?;

    let email = auth.email;
    let group = state
        .store_call("submit_join_request", move |store| {
            store.submit_join_request(&group_id, &email)
        })
        .await?;

    Ok(Json(group))
}

/// One roster of a group.
#[derive(Debug, Serialize)]
pub struct RosterResponse {
    /// The group.
    pub group_id: GroupId,
    /// Which roster this is.
    pub roster: GroupRoster,
    /// Emails in join or arrival order.
    pub emails: Vec<Email>,
}

impl RosterResponse {
    fn of(group: &Group, roster: GroupRoster) -> Self {
        Self {
            group_id: group.id,
            roster,
            emails: group.roster(roster).into_iter().cloned().collect(),
        }
    }
}

/// Current members of a group.
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<RosterResponse>, ApiError> {
    let group = load_group(&state, id.parse()?).await?;
    Ok(Json(RosterResponse::of(&group, GroupRoster::Members)))
}

/// Pending join requests of a group.
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<RosterResponse>, ApiError> {
    let group = load_group(&state, id.parse()?).await?;
    Ok(Json(RosterResponse::of(&group, GroupRoster::Requests)))
}

/// Owner's decision on a join request.
#[derive(Debug, Deserialize)]
pub struct JoinDecision {
    /// Requesting email.
    pub email: String,
    /// `accept` or `reject`.
    pub action: String,
}

/// Accept or reject a pending join request (owner).
pub async fn respond_to_join_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<JoinDecision>,
) -> Result<Json<Group>, ApiError> {
    let group_id: GroupId = id.parse()?;
    let email = Email::parse(&body.email)?;
    let action: JoinAction = body.action.parse()?;

    let responder = auth.email;
    let group = state
        .store_call("respond_to_join_request", move |store| {
            store.respond_to_join_request(&group_id, &responder, &email, action)
        })
        .await?;

    Ok(Json(group))
}

/// Role change request.
#[derive(Debug, Deserialize)]
pub struct RoleChange {
    /// `admin` or `member`.
    pub role: String,
}

/// Change a member's role (owner).
pub async fn set_member_role(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((id, email)): Path<(String, String)>,
    ApiJson(body): ApiJson<RoleChange>,
) -> Result<Json<Group>, ApiError> {
    let group_id: GroupId = id.parse()?;
    let email = Email::parse(&email)?;
    let role: GroupRole = body.role.parse()?;

    let actor = auth.email;
    let group = state
        .store_call("set_member_role", move |store| {
            store.set_member_role(&group_id, &actor, &email, role)
        })
        .await?;

    Ok(Json(group))
}

/// Delete a group (owner).
pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    let group_id: GroupId = id.parse()?;

    let requester = auth.email;
    state
        .store_call("delete_group", move |store| {
            store.delete_group(&group_id, &requester)
        })
        .await?;

    Ok(Json(Ack::ok()))
}
