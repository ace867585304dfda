//! Announcement handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use guild_core::Announcement;
use guild_store::Store;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::handlers::{CountResponse, ListResponse, WindowParams};
use crate::state::AppState;

/// Announcement creation request.
#[derive(Debug, Deserialize)]
pub struct CreateAnnouncementRequest {
    /// Headline.
    pub title: String,
    /// Body text.
    pub description: String,
}

/// Publish an announcement (admin).
pub async fn create_announcement(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    ApiJson(body): ApiJson<CreateAnnouncementRequest>,
) -> Result<Json<Announcement>, ApiError> {
    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".into()));
    }

    let announcement = Announcement::new(admin.user.email, body.title.trim(), body.description);

    let stored = announcement.clone();
    state
        .store_call("put_announcement", move |store| store.put_announcement(&stored))
        .await?;

    tracing::info!(announcement_id = %announcement.id, "Announcement published");
    Ok(Json(announcement))
}

/// List announcements, newest first.
pub async fn list_announcements(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<WindowParams>,
) -> Result<Json<ListResponse<Announcement>>, ApiError> {
    let window = params.window();
    let page = state
        .store_call("list_announcements", move |store| {
            store.list_announcements(window)
        })
        .await?;

    Ok(Json(ListResponse::from_page(page, window)))
}

/// Fast announcement count.
pub async fn count_announcements(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state
        .store_call("count_announcements", |store| {
            store.estimated_announcement_count()
        })
        .await?;

    Ok(Json(CountResponse {
        count,
        estimated: true,
    }))
}
