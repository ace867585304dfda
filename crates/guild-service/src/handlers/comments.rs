//! Comment handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use guild_core::{Comment, CommentId, ForumError, PostId};
use guild_store::Store;

use crate::auth::{is_admin, AuthUser};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::handlers::Ack;
use crate::state::AppState;

/// Comment creation request.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    /// Post being commented on.
    pub post_id: String,
    /// Comment text.
    pub body: String,
}

/// Comment on a post as the caller.
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<CreateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    let post_id: PostId = body.post_id.parse()?;
    if body.body.trim().is_empty() {
        return Err(ApiError::BadRequest("comment body is required".into()));
    }

    let author = auth.email;
    let comment = state
        .store_call("create_comment", move |store| {
            let post = store
                .get_post(&post_id)?
                .ok_or_else(|| ForumError::not_found("post", post_id))?;
            let comment = Comment::new(post.id, post.title, author.clone(), body.body.clone());
            store.insert_comment(&comment)?;
            Ok(comment)
        })
        .await?;

    tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "Comment added");
    Ok(Json(comment))
}

/// Comment listing parameters.
#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    /// Only comments on this post.
    pub post_id: Option<String>,
    /// Only comments on posts with this exact title.
    pub post_title: Option<String>,
}

/// List comments, oldest first.
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListCommentsQuery>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let post_id = params
        .post_id
        .as_deref()
        .map(str::parse::<PostId>)
        .transpose()?;
    let post_title = params.post_title;

    let comments = state
        .store_call("list_comments", move |store| {
            store.list_comments(post_id.as_ref(), post_title.as_deref())
        })
        .await?;

    Ok(Json(comments))
}

/// Delete a comment (its author or an admin).
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    let comment_id: CommentId = id.parse()?;

    let comment = state
        .store_call("get_comment", move |store| store.get_comment(&comment_id))
        .await?
        .ok_or_else(|| ForumError::not_found("comment", comment_id))?;

    if comment.author_email != auth.email && !is_admin(&state, &auth.email).await? {
        return Err(ApiError::Forbidden(Some(
            "only the author or an admin can delete a comment".into(),
        )));
    }

    state
        .store_call("delete_comment", move |store| store.delete_comment(&comment_id))
        .await?;

    Ok(Json(Ack::ok()))
}
