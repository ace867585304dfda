//! Abuse report handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use guild_core::{CommentId, Report, ReportId, ReportView};
use guild_store::Store;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::handlers::{Ack, ListResponse, WindowParams};
use crate::state::AppState;

/// Report creation request.
#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    /// The offending comment.
    pub comment_id: String,
    /// Why it is being reported.
    pub reason: String,
}

/// Report a comment. The comment is resolved when reports are listed.
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<CreateReportRequest>,
) -> Result<Json<Report>, ApiError> {
    let comment_id: CommentId = body.comment_id.parse()?;
    let report = Report::new(comment_id, auth.email, body.reason.trim());

    let stored = report.clone();
    state
        .store_call("put_report", move |store| store.put_report(&stored))
        .await?;

    Ok(Json(report))
}

/// Moderation queue: reports joined with their comments (admin).
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiQuery(params): ApiQuery<WindowParams>,
) -> Result<Json<ListResponse<ReportView>>, ApiError> {
    let window = params.window();
    let page = state
        .store_call("list_reports", move |store| store.list_reports(window))
        .await?;

    Ok(Json(ListResponse::from_page(page, window)))
}

/// Whether a comment has any report against it.
#[derive(Debug, Serialize)]
pub struct ReportMatch {
    /// Whether the comment has been reported.
    #[serde(rename = "match")]
    pub matched: bool,
}

/// Whether a comment has been reported.
pub async fn report_exists(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(comment_id): Path<String>,
) -> Result<Json<ReportMatch>, ApiError> {
    let comment_id: CommentId = comment_id.parse()?;

    let matched = state
        .store_call("report_exists", move |store| {
            store.report_exists_for_comment(&comment_id)
        })
        .await?;

    Ok(Json(ReportMatch { matched }))
}

/// Dismiss a report (admin).
pub async fn delete_report(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    let report_id: ReportId = id.parse()?;

    state
        .store_call("delete_report", move |store| store.delete_report(&report_id))
        .await?;

    tracing::info!(report_id = %report_id, admin = %admin.user.email, "Report dismissed");
    Ok(Json(Ack::ok()))
}
