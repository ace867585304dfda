//! Comments and abuse reports.
//!
//! A report references its comment by [`CommentId`]. The reference is resolved
//! lazily: reports whose comment was deleted stay in storage but never appear
//! in a [`ReportView`], which only exists for a resolved pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CommentId, Email, PostId, ReportId};

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier.
    pub id: CommentId,

    /// The post being discussed.
    pub post_id: PostId,

    /// Title of that post, copied at comment time for title lookups.
    #[serde(default)]
    pub post_title: String,

    /// Commenter.
    pub author_email: Email,

    /// Comment text.
    pub body: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a comment on `post_id`.
    #[must_use]
    pub fn new(
        post_id: PostId,
        post_title: impl Into<String>,
        author_email: Email,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: CommentId::generate(),
            post_id,
            post_title: post_title.into(),
            author_email,
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// An abuse report filed against a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Report identifier.
    pub id: ReportId,

    /// The reported comment (may dangle after the comment is deleted).
    pub comment_id: CommentId,

    /// Who filed the report.
    pub reporter_email: Email,

    /// Free-form reason.
    pub reason: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// File a report against `comment_id`.
    #[must_use]
    pub fn new(comment_id: CommentId, reporter_email: Email, reason: impl Into<String>) -> Self {
        Self {
            id: ReportId::generate(),
            comment_id,
            reporter_email,
            reason: reason.into(),
            created_at: Utc::now(),
        }
    }
}

/// Denormalized moderation row: a report joined with the comment it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportView {
    /// Report identifier.
    pub report_id: ReportId,

    /// Report reason.
    pub report: String,

    /// Reporter.
    pub reporter_email: Email,

    /// Reported comment.
    pub comment_id: CommentId,

    /// Reported comment text.
    pub comment: String,

    /// Who wrote the comment.
    pub commenter_email: Email,

    /// Post the comment belongs to.
    pub post_id: PostId,

    /// When the report was filed.
    pub reported_at: DateTime<Utc>,
}

impl ReportView {
    /// Join a report with its comment.
    ///
    /// Returns `None` when `comment` is not the one the report references.
    #[must_use]
    pub fn join(report: &Report, comment: &Comment) -> Option<Self> {
        (report.comment_id == comment.id).then(|| Self {
            report_id: report.id,
            report: report.reason.clone(),
            reporter_email: report.reporter_email.clone(),
            comment_id: comment.id,
            comment: comment.body.clone(),
            commenter_email: comment.author_email.clone(),
            post_id: comment.post_id,
            reported_at: report.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    #[test]
    fn join_projects_comment_fields() {
        let comment = Comment::new(PostId::generate(), "Title", email("c@x.com"), "rude words");
        let report = Report::new(comment.id, email("r@x.com"), "abusive");

        let view = ReportView::join(&report, &comment).unwrap();
        assert_eq!(view.report_id, report.id);
        assert_eq!(view.report, "abusive");
        assert_eq!(view.comment, "rude words");
        assert_eq!(view.commenter_email, email("c@x.com"));
        assert_eq!(view.post_id, comment.post_id);
    }

    #[test]
    fn join_rejects_mismatched_comment() {
        let comment = Comment::new(PostId::generate(), "", email("c@x.com"), "text");
        let report = Report::new(CommentId::generate(), email("r@x.com"), "spam");
        assert!(ReportView::join(&report, &comment).is_none());
    }
}
