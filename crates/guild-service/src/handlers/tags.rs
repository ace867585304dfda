//! Tag handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use guild_core::Tag;
use guild_store::Store;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Tag creation request.
#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    /// Tag name.
    pub name: String,
}

/// Add a tag (admin). Names are unique ignoring case.
pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiJson(body): ApiJson<CreateTagRequest>,
) -> Result<Json<Tag>, ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("tag name is required".into()));
    }

    let tag = Tag::new(&body.name);
    let stored = tag.clone();
    state
        .store_call("insert_tag", move |store| store.insert_tag(&stored))
        .await?;

    tracing::info!(tag = %tag.name, "Tag added");
    Ok(Json(tag))
}

/// List tags alphabetically.
pub async fn list_tags(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Tag>>, ApiError> {
    let tags = state
        .store_call("list_tags", |store| store.list_tags())
        .await?;
    Ok(Json(tags))
}
