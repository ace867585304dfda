//! Core types and rules for the guild forum backend.
//!
//! This crate provides the foundational types used throughout guild:
//!
//! - **Identifiers**: `Email`, `PostId`, `CommentId`, `ReportId`, `GroupId`, ...
//! - **Users**: `User`, `Role`, `Badge`
//! - **Posts**: `Post`, `VotedBy`, `VoteType`, `VoteOutcome` (the vote engine)
//! - **Moderation**: `Comment`, `Report`, `ReportView`
//! - **Relationships**: `FriendRequest`, `FriendStatus`, `FriendPair`
//! - **Groups**: `Group`, `GroupMember`, `JoinRequest`, `JoinAction`
//! - **Queries**: `PostQuery`, `Window`, `Page`, `TextFilter`
//!
//! Every state transition lives here as a pure method on the owning document.
//! The store applies them under a per-document lock and commits the result in
//! one write, so the rules never observe a half-applied update.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod comment;
pub mod content;
pub mod error;
pub mod friend;
pub mod group;
pub mod ids;
pub mod post;
pub mod query;
pub mod user;

pub use comment::{Comment, Report, ReportView};
pub use content::{Announcement, Payment, Tag};
pub use error::{ForumError, Result};
pub use friend::{FriendPair, FriendRequest, FriendStatus};
pub use group::{
    Group, GroupMember, GroupRole, GroupRoster, JoinAction, JoinRequest, MAX_GROUP_NAME_CHARS,
};
pub use ids::{
    AnnouncementId, CommentId, Email, FriendRequestId, GroupId, IdError, PaymentId, PostId,
    ReportId,
};
pub use post::{Post, VoteOutcome, VoteType, VotedBy};
pub use query::{Page, PostQuery, SortOrder, TextFilter, Window, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use user::{Badge, Role, User};
