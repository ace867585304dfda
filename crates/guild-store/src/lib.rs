//! `RocksDB` storage layer for guild.
//!
//! This crate provides persistent storage for users, posts, comments, reports,
//! friend relations, groups, announcements, tags, and payments using `RocksDB`
//! with column families for efficient indexing.
//!
//! # Atomicity
//!
//! Every read-modify-write runs under a striped per-key lock and commits the
//! document together with its index entries in one `WriteBatch`. Compound
//! updates (a vote switch touching both counters and both voter sets, a
//! join-request accept moving an email from `requests` to `members`) are
//! therefore never observed half-applied, and uniqueness checks (friend pairs,
//! group names, tags, user emails) cannot race with the insert they guard.
//!
//! # Example
//!
//! ```no_run
//! use guild_store::{RocksStore, Store};
//! use guild_core::{Email, User};
//!
//! let store = RocksStore::open("/tmp/guild-db").unwrap();
//!
//! let email = Email::parse("alice@x.com").unwrap();
//! let inserted = store.insert_user_if_absent(&User::new(email.clone(), "Alice", None)).unwrap();
//! assert!(inserted);
//!
//! let user = store.get_user(&email).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use guild_core::{
    Announcement, Comment, CommentId, Email, FriendRequest, FriendRequestId, FriendStatus, Group,
    GroupId, GroupRole, JoinAction, Page, Payment, Post, PostId, PostQuery, Report, ReportId,
    ReportView, Role, Tag, TextFilter, User, VoteOutcome, VoteType, Window,
};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing). Domain-rule failures come back as
/// `StoreError::Domain` so callers can tell them apart from I/O failures.
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert a user unless one with the same email exists.
    ///
    /// Returns `true` if the user was inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn insert_user_if_absent(&self, user: &User) -> Result<bool>;

    /// Get a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, email: &Email) -> Result<Option<User>>;

    /// List all users in email order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_users(&self) -> Result<Vec<User>>;

    /// Delete a user by email.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the user doesn't exist.
    fn delete_user(&self, email: &Email) -> Result<()>;

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the user doesn't exist.
    fn set_user_role(&self, email: &Email, role: Role) -> Result<User>;

    /// Set a user's warning flag.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the user doesn't exist.
    fn warn_user(&self, email: &Email) -> Result<User>;

    // =========================================================================
    // Announcement and Tag Operations
    // =========================================================================

    /// Insert an announcement.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_announcement(&self, announcement: &Announcement) -> Result<()>;

    /// List announcements, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_announcements(&self, window: Window) -> Result<Page<Announcement>>;

    /// Fast, possibly stale announcement count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn estimated_announcement_count(&self) -> Result<u64>;

    /// Insert a tag.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::Conflict` if a tag with the same case-folded name exists.
    fn insert_tag(&self, tag: &Tag) -> Result<()>;

    /// List tags alphabetically.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_tags(&self) -> Result<Vec<Tag>>;

    // =========================================================================
    // Post Operations
    // =========================================================================

    /// Insert a post.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_post(&self, post: &Post) -> Result<()>;

    /// Get a post by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_post(&self, post_id: &PostId) -> Result<Option<Post>>;

    /// Delete a post and return it.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the post doesn't exist.
    fn delete_post(&self, post_id: &PostId) -> Result<Post>;

    /// Filter, sort, and window posts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_posts(&self, query: &PostQuery) -> Result<Page<Post>>;

    /// Fast, possibly stale count of all posts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn estimated_post_count(&self) -> Result<u64>;

    /// Exact count of posts, optionally restricted to one author.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn count_posts(&self, author: Option<&Email>) -> Result<u64>;

    /// Apply a vote atomically and return the outcome with the updated post.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the post doesn't exist.
    fn apply_vote(&self, post_id: &PostId, voter: &Email, vote: VoteType)
        -> Result<(VoteOutcome, Post)>;

    // =========================================================================
    // Comment and Report Operations
    // =========================================================================

    /// Insert a comment.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the commented post doesn't exist.
    fn insert_comment(&self, comment: &Comment) -> Result<()>;

    /// Get a comment by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_comment(&self, comment_id: &CommentId) -> Result<Option<Comment>>;

    /// List comments oldest first, optionally for one post (by id or title).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_comments(&self, post_id: Option<&PostId>, post_title: Option<&str>)
        -> Result<Vec<Comment>>;

    /// Delete a comment and return it. Reports against it are left dangling.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the comment doesn't exist.
    fn delete_comment(&self, comment_id: &CommentId) -> Result<Comment>;

    /// Insert a report. The comment reference is resolved lazily.
    ///
    /// This also maintains the comment index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_report(&self, report: &Report) -> Result<()>;

    /// Whether any report names `comment_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn report_exists_for_comment(&self, comment_id: &CommentId) -> Result<bool>;

    /// Join reports with their comments, newest report first, dropping
    /// reports whose comment is gone, then window the joined rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_reports(&self, window: Window) -> Result<Page<ReportView>>;

    /// Delete a report.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the report doesn't exist.
    fn delete_report(&self, report_id: &ReportId) -> Result<()>;

    // =========================================================================
    // Payment Operations
    // =========================================================================

    /// Record a payment and grant the payer the gold badge in one write.
    ///
    /// Returns the updated user.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the payer has no user record.
    fn record_payment(&self, payment: &Payment) -> Result<User>;

    /// List payments newest first, optionally for one payer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_payments(&self, email: Option<&Email>) -> Result<Vec<Payment>>;

    // =========================================================================
    // Friend Relation Operations
    // =========================================================================

    /// Insert a pending request unless the pair already has a relation in any
    /// status, in either direction.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::Conflict` ("already requested") for an occupied pair.
    fn create_friend_request(&self, request: &FriendRequest) -> Result<()>;

    /// Get a relation by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_friend_request(&self, request_id: &FriendRequestId) -> Result<Option<FriendRequest>>;

    /// Answer a pending request as `responder`.
    ///
    /// # Errors
    ///
    /// - `ForumError::NotFound` if the relation doesn't exist.
    /// - `ForumError::Forbidden` if `responder` is not the recipient.
    /// - `ForumError::Conflict` if the request was already answered.
    fn respond_friend_request(
        &self,
        request_id: &FriendRequestId,
        responder: &Email,
        status: FriendStatus,
    ) -> Result<FriendRequest>;

    /// Relations addressed to `email`, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn incoming_friend_requests(
        &self,
        email: &Email,
        status: Option<FriendStatus>,
    ) -> Result<Vec<FriendRequest>>;

    /// Accepted relations in which `email` is either party.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn friends_of(&self, email: &Email) -> Result<Vec<FriendRequest>>;

    // =========================================================================
    // Group Operations
    // =========================================================================

    /// Insert a new group unless its name is taken.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::Conflict` if the case-folded name exists.
    fn create_group(&self, group: &Group) -> Result<()>;

    /// Get a group by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_group(&self, group_id: &GroupId) -> Result<Option<Group>>;

    /// List groups newest first, optionally filtered by name substring.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_groups(&self, name: Option<&TextFilter>, window: Window) -> Result<Page<Group>>;

    /// Append a join request for `email`.
    ///
    /// # Errors
    ///
    /// - `ForumError::NotFound` if the group doesn't exist.
    /// - `ForumError::Conflict` if `email` already requested or is a member.
    fn submit_join_request(&self, group_id: &GroupId, email: &Email) -> Result<Group>;

    /// Accept or reject `email`'s request as `responder`.
    ///
    /// # Errors
    ///
    /// - `ForumError::NotFound` if the group or the request doesn't exist.
    /// - `ForumError::Forbidden` if `responder` is not the owner.
    fn respond_to_join_request(
        &self,
        group_id: &GroupId,
        responder: &Email,
        email: &Email,
        action: JoinAction,
    ) -> Result<Group>;

    /// Assign a member's role as `actor`.
    ///
    /// # Errors
    ///
    /// - `ForumError::NotFound` if the group or member doesn't exist.
    /// - `ForumError::Forbidden` if `actor` is not the owner.
    /// - `ForumError::Conflict` when targeting the owner.
    fn set_member_role(
        &self,
        group_id: &GroupId,
        actor: &Email,
        email: &Email,
        role: GroupRole,
    ) -> Result<Group>;

    /// Delete a group as `requester`, releasing its name.
    ///
    /// # Errors
    ///
    /// - `ForumError::NotFound` if the group doesn't exist.
    /// - `ForumError::Forbidden` if `requester` is not the owner.
    fn delete_group(&self, group_id: &GroupId, requester: &Email) -> Result<()>;

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Flush memtables to disk (called on shutdown).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn flush(&self) -> Result<()>;
}
