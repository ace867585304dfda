//! Post and vote handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use guild_core::{
    Email, ForumError, Post, PostId, PostQuery, SortOrder, TextFilter, VoteOutcome, VoteType,
    Window,
};
use guild_store::Store;

use crate::auth::{is_admin, AuthUser};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::handlers::{Ack, CountResponse, ListResponse};
use crate::state::AppState;

/// Post creation request.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    /// Title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Tag.
    pub tag: String,
}

/// Create a post authored by the caller.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<CreatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".into()));
    }

    let author = auth.email;
    let post = state
        .store_call("create_post", move |store| {
            let author_name = store
                .get_user(&author)?
                .map_or_else(|| author.to_string(), |u| u.name);
            let post = Post::new(
                author.clone(),
                author_name,
                body.title.trim(),
                body.body.clone(),
                body.tag.trim(),
            );
            store.put_post(&post)?;
            Ok(post)
        })
        .await?;

    tracing::info!(post_id = %post.id, author = %post.author_email, "Post created");
    Ok(Json(post))
}

/// Post listing parameters.
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    /// Only posts by this author.
    pub email: Option<String>,
    /// Case-insensitive tag substring.
    pub search: Option<String>,
    /// `newest` (default) or `popular`.
    #[serde(default)]
    pub sort: SortOrder,
    /// First N results; wins over `page`/`size`.
    pub limit: Option<usize>,
    /// Zero-based page number.
    pub page: Option<usize>,
    /// Results per page.
    pub size: Option<usize>,
}

/// List posts.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListPostsQuery>,
) -> Result<Json<ListResponse<Post>>, ApiError> {
    let author = params
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .map(Email::parse)
        .transpose()?;

    let query = PostQuery {
        author,
        tag: TextFilter::parse(params.search.as_deref()),
        sort: params.sort,
        window: Window::from_params(params.limit, params.page, params.size),
    };

    let window = query.window;
    let page = state
        .store_call("list_posts", move |store| store.list_posts(&query))
        .await?;

    Ok(Json(ListResponse::from_page(page, window)))
}

/// Fetch a single post.
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let post_id: PostId = id.parse()?;

    let post = state
        .store_call("get_post", move |store| store.get_post(&post_id))
        .await?
        .ok_or_else(|| ForumError::not_found("post", post_id))?;

    Ok(Json(post))
}

/// Delete a post (author or admin). Its comments are kept.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    let post_id: PostId = id.parse()?;

    let post = state
        .store_call("get_post", move |store| store.get_post(&post_id))
        .await?
        .ok_or_else(|| ForumError::not_found("post", post_id))?;

    if post.author_email != auth.email && !is_admin(&state, &auth.email).await? {
        return Err(ApiError::Forbidden(Some(
            "only the author or an admin can delete a post".into(),
        )));
    }

    state
        .store_call("delete_post", move |store| store.delete_post(&post_id))
        .await?;

    Ok(Json(Ack::ok()))
}

/// Vote request.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    /// `upvote` or `downvote`.
    pub vote_type: String,
}

/// Vote response.
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    /// `cast`, `switched`, or `already_voted`.
    pub outcome: &'static str,
    /// Human-readable outcome.
    pub message: &'static str,
    /// Up vote count after the call.
    pub up_vote: u64,
    /// Down vote count after the call.
    pub down_vote: u64,
}

impl VoteResponse {
    fn new(outcome: VoteOutcome, post: &Post) -> Self {
        let label = match outcome {
            VoteOutcome::Cast(_) => "cast",
            VoteOutcome::Switched(_) => "switched",
            VoteOutcome::AlreadyVoted(_) => "already_voted",
        };

        Self {
            outcome: label,
            message: outcome.message(),
            up_vote: post.up_vote,
            down_vote: post.down_vote,
        }
    }
}

/// Cast, switch, or repeat the caller's vote on a post.
///
/// Repeating a vote is not an error; it answers `already_voted` and leaves
/// the post unchanged.
pub async fn vote(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<VoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let post_id: PostId = id.parse()?;
    let vote: VoteType = body.vote_type.parse()?;

    let voter = auth.email;
    let (outcome, post) = state
        .store_call("apply_vote", move |store| {
            store.apply_vote(&post_id, &voter, vote)
        })
        .await?;

    Ok(Json(VoteResponse::new(outcome, &post)))
}

/// Fast total post count.
pub async fn estimated_post_count(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state
        .store_call("estimated_post_count", |store| store.estimated_post_count())
        .await?;

    Ok(Json(CountResponse {
        count,
        estimated: true,
    }))
}

/// Exact post count parameters.
#[derive(Debug, Deserialize)]
pub struct PostCountQuery {
    /// Only count posts by this author.
    pub email: Option<String>,
}

/// Exact post count, optionally for one author.
pub async fn post_count(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<PostCountQuery>,
) -> Result<Json<CountResponse>, ApiError> {
    let author = params
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .map(Email::parse)
        .transpose()?;

    let count = state
        .store_call("count_posts", move |store| store.count_posts(author.as_ref()))
        .await?;

    Ok(Json(CountResponse {
        count,
        estimated: false,
    }))
}
