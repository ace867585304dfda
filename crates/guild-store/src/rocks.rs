//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use guild_core::{
    Announcement, Badge, Comment, CommentId, Email, ForumError, FriendRequest, FriendRequestId,
    FriendStatus, Group, GroupId, GroupRole, JoinAction, Page, Payment, Post, PostId, PostQuery,
    Report, ReportId, ReportView, Role, Tag, TextFilter, User, VoteOutcome, VoteType, Window,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// Number of mutexes guarding read-modify-write sequences.
const LOCK_STRIPES: usize = 64;

const ESTIMATE_NUM_KEYS: &str = "rocksdb.estimate-num-keys";

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    locks: Box<[Mutex<()>]>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)?;
        let locks = (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect();

        Ok(Self {
            db: Arc::new(db),
            locks,
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Take the stripe guarding `key` in `scope`.
    ///
    /// Callers hold at most one stripe at a time, so stripes cannot deadlock.
    fn lock(&self, scope: &str, key: &[u8]) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        scope.hash(&mut hasher);
        key.hash(&mut hasher);
        let stripe = usize::try_from(hasher.finish() % LOCK_STRIPES as u64).unwrap_or_default();

        self.locks[stripe]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn get_doc<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;

        self.db
            .get_cf(&cf, key)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put_doc<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        self.db.put_cf(&cf, key, Self::serialize(value)?)?;
        Ok(())
    }

    fn exists(&self, cf_name: &str, key: &[u8]) -> Result<bool> {
        let cf = self.cf(cf_name)?;
        Ok(self.db.get_pinned_cf(&cf, key)?.is_some())
    }

    /// Every document of a column family, in key order or reversed.
    fn scan<T: DeserializeOwned>(&self, cf_name: &str, newest_first: bool) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mode = if newest_first {
            IteratorMode::End
        } else {
            IteratorMode::Start
        };

        self.db
            .iterator_cf(&cf, mode)
            .map(|item| {
                let (_, value) = item?;
                Self::deserialize(&value)
            })
            .collect()
    }

    /// Trailing ids of every index key under `prefix`.
    fn index_ids(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<[u8; 16]>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut ids = Vec::new();
        for item in iter {
            let (key, _) = item?;

            if !key.starts_with(prefix) {
                break;
            }

            if let Some(id) = keys::trailing_id(&key) {
                ids.push(id);
            }
        }

        Ok(ids)
    }

    fn estimated_count(&self, cf_name: &str) -> Result<u64> {
        let cf = self.cf(cf_name)?;
        Ok(self
            .db
            .property_int_value_cf(&cf, ESTIMATE_NUM_KEYS)?
            .unwrap_or_default())
    }

    /// Load, mutate, and rewrite one document under its stripe.
    ///
    /// `mutate` may stage extra writes into the batch; they commit together
    /// with the document. A failing `mutate` writes nothing.
    fn update_doc<T, R>(
        &self,
        cf_name: &str,
        key: &[u8],
        entity: &'static str,
        id: &dyn fmt::Display,
        mutate: impl FnOnce(&mut T, &mut WriteBatch) -> Result<R>,
    ) -> Result<(T, R)>
    where
        T: Serialize + DeserializeOwned,
    {
        let _guard = self.lock(cf_name, key);

        let mut doc: T = self
            .get_doc(cf_name, key)?
            .ok_or_else(|| ForumError::not_found(entity, id))?;

        let mut batch = WriteBatch::default();
        let result = mutate(&mut doc, &mut batch)?;

        let cf = self.cf(cf_name)?;
        batch.put_cf(&cf, key, Self::serialize(&doc)?);
        self.db.write(batch)?;

        Ok((doc, result))
    }

    fn friend_requests_of(&self, email: &Email) -> Result<Vec<FriendRequest>> {
        let prefix = keys::user_friend_requests_prefix(email);
        let mut requests = Vec::new();

        for id in self.index_ids(cf::FRIEND_REQUESTS_BY_USER, &prefix)? {
            if let Some(request) = self.get_friend_request(&FriendRequestId::from_bytes(id))? {
                requests.push(request);
            }
        }

        Ok(requests)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn insert_user_if_absent(&self, user: &User) -> Result<bool> {
        let key = keys::user_key(&user.email);
        let _guard = self.lock(cf::USERS, &key);

        if self.exists(cf::USERS, &key)? {
            return Ok(false);
        }

        self.put_doc(cf::USERS, &key, user)?;
        tracing::info!(email = %user.email, "user registered");
        Ok(true)
    }

    fn get_user(&self, email: &Email) -> Result<Option<User>> {
        self.get_doc(cf::USERS, &keys::user_key(email))
    }

    fn list_users(&self) -> Result<Vec<User>> {
        self.scan(cf::USERS, false)
    }

    fn delete_user(&self, email: &Email) -> Result<()> {
        let key = keys::user_key(email);
        let _guard = self.lock(cf::USERS, &key);

        if !self.exists(cf::USERS, &key)? {
            return Err(ForumError::not_found("user", email).into());
        }

        let cf = self.cf(cf::USERS)?;
        self.db.delete_cf(&cf, key)?;
        Ok(())
    }

    fn set_user_role(&self, email: &Email, role: Role) -> Result<User> {
        let key = keys::user_key(email);
        let (user, ()) = self.update_doc(cf::USERS, &key, "user", email, |user: &mut User, _| {
            user.role = role;
            Ok(())
        })?;

        tracing::info!(email = %email, role = ?role, "user role changed");
        Ok(user)
    }

    fn warn_user(&self, email: &Email) -> Result<User> {
        let key = keys::user_key(email);
        let (user, ()) = self.update_doc(cf::USERS, &key, "user", email, |user: &mut User, _| {
            user.warned = true;
            Ok(())
        })?;

        tracing::info!(email = %email, "user warned");
        Ok(user)
    }

    // =========================================================================
    // Announcement and Tag Operations
    // =========================================================================

    fn put_announcement(&self, announcement: &Announcement) -> Result<()> {
        let key = keys::id_key(announcement.id.to_bytes());
        self.put_doc(cf::ANNOUNCEMENTS, &key, announcement)
    }

    fn list_announcements(&self, window: Window) -> Result<Page<Announcement>> {
        let announcements = self.scan(cf::ANNOUNCEMENTS, true)?;
        Ok(Page::from_filtered(announcements, window))
    }

    fn estimated_announcement_count(&self) -> Result<u64> {
        self.estimated_count(cf::ANNOUNCEMENTS)
    }

    fn insert_tag(&self, tag: &Tag) -> Result<()> {
        let key = keys::tag_key(&tag.key());
        let _guard = self.lock(cf::TAGS, &key);

        if self.exists(cf::TAGS, &key)? {
            return Err(ForumError::Conflict(format!("tag already exists: {}", tag.name)).into());
        }

        self.put_doc(cf::TAGS, &key, tag)
    }

    fn list_tags(&self) -> Result<Vec<Tag>> {
        self.scan(cf::TAGS, false)
    }

    // =========================================================================
    // Post Operations
    // =========================================================================

    fn put_post(&self, post: &Post) -> Result<()> {
        self.put_doc(cf::POSTS, &keys::id_key(post.id.to_bytes()), post)
    }

    fn get_post(&self, post_id: &PostId) -> Result<Option<Post>> {
        self.get_doc(cf::POSTS, &keys::id_key(post_id.to_bytes()))
    }

    fn delete_post(&self, post_id: &PostId) -> Result<Post> {
        let key = keys::id_key(post_id.to_bytes());
        let _guard = self.lock(cf::POSTS, &key);

        let post: Post = self
            .get_doc(cf::POSTS, &key)?
            .ok_or_else(|| ForumError::not_found("post", post_id))?;

        let cf = self.cf(cf::POSTS)?;
        self.db.delete_cf(&cf, key)?;

        tracing::info!(post_id = %post_id, "post deleted");
        Ok(post)
    }

    fn list_posts(&self, query: &PostQuery) -> Result<Page<Post>> {
        let posts: Vec<Post> = self.scan(cf::POSTS, false)?;
        Ok(query.run(posts))
    }

    fn estimated_post_count(&self) -> Result<u64> {
        self.estimated_count(cf::POSTS)
    }

    fn count_posts(&self, author: Option<&Email>) -> Result<u64> {
        let posts: Vec<Post> = self.scan(cf::POSTS, false)?;
        let count = posts
            .iter()
            .filter(|p| author.map_or(true, |a| &p.author_email == a))
            .count();

        Ok(count as u64)
    }

    fn apply_vote(
        &self,
        post_id: &PostId,
        voter: &Email,
        vote: VoteType,
    ) -> Result<(VoteOutcome, Post)> {
        let key = keys::id_key(post_id.to_bytes());
        let (post, outcome) = self.update_doc(cf::POSTS, &key, "post", post_id, |post: &mut Post, _| {
            Ok(post.apply_vote(voter, vote))
        })?;

        tracing::debug!(
            post_id = %post_id,
            voter = %voter,
            outcome = ?outcome,
            changed = outcome.changed(),
            up_vote = post.up_vote,
            down_vote = post.down_vote,
            "vote applied"
        );
        Ok((outcome, post))
    }

    // =========================================================================
    // Comment and Report Operations
    // =========================================================================

    fn insert_comment(&self, comment: &Comment) -> Result<()> {
        let post_key = keys::id_key(comment.post_id.to_bytes());
        if !self.exists(cf::POSTS, &post_key)? {
            return Err(ForumError::not_found("post", comment.post_id).into());
        }

        self.put_doc(cf::COMMENTS, &keys::id_key(comment.id.to_bytes()), comment)
    }

    fn get_comment(&self, comment_id: &CommentId) -> Result<Option<Comment>> {
        self.get_doc(cf::COMMENTS, &keys::id_key(comment_id.to_bytes()))
    }

    fn list_comments(
        &self,
        post_id: Option<&PostId>,
        post_title: Option<&str>,
    ) -> Result<Vec<Comment>> {
        let comments: Vec<Comment> = self.scan(cf::COMMENTS, false)?;

        Ok(comments
            .into_iter()
            .filter(|c| post_id.map_or(true, |id| &c.post_id == id))
            .filter(|c| post_title.map_or(true, |title| c.post_title == title))
            .collect())
    }

    fn delete_comment(&self, comment_id: &CommentId) -> Result<Comment> {
        let key = keys::id_key(comment_id.to_bytes());
        let _guard = self.lock(cf::COMMENTS, &key);

        let comment: Comment = self
            .get_doc(cf::COMMENTS, &key)?
            .ok_or_else(|| ForumError::not_found("comment", comment_id))?;

        let cf = self.cf(cf::COMMENTS)?;
        self.db.delete_cf(&cf, key)?;

        tracing::info!(comment_id = %comment_id, "comment deleted");
        Ok(comment)
    }

    fn put_report(&self, report: &Report) -> Result<()> {
        let cf_reports = self.cf(cf::REPORTS)?;
        let cf_by_comment = self.cf(cf::REPORTS_BY_COMMENT)?;

        let report_key = keys::id_key(report.id.to_bytes());
        let index_key = keys::comment_report_key(&report.comment_id, &report.id);

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_reports, &report_key, Self::serialize(report)?);
        batch.put_cf(&cf_by_comment, &index_key, []); // Index entry (empty value)
        self.db.write(batch)?;

        tracing::info!(
            report_id = %report.id,
            comment_id = %report.comment_id,
            reporter = %report.reporter_email,
            "comment reported"
        );
        Ok(())
    }

    fn report_exists_for_comment(&self, comment_id: &CommentId) -> Result<bool> {
        let cf = self.cf(cf::REPORTS_BY_COMMENT)?;
        let prefix = keys::comment_reports_prefix(comment_id);

        let first = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward))
            .next()
            .transpose()?;

        Ok(first.is_some_and(|(key, _)| key.starts_with(&prefix)))
    }

    fn list_reports(&self, window: Window) -> Result<Page<ReportView>> {
        let reports: Vec<Report> = self.scan(cf::REPORTS, true)?;

        let mut joined = Vec::with_capacity(reports.len());
        for report in &reports {
            match self.get_comment(&report.comment_id)? {
                Some(comment) => joined.extend(ReportView::join(report, &comment)),
                None => {
                    tracing::debug!(
                        report_id = %report.id,
                        comment_id = %report.comment_id,
                        "dropping report of deleted comment"
                    );
                }
            }
        }

        Ok(Page::from_filtered(joined, window))
    }

    fn delete_report(&self, report_id: &ReportId) -> Result<()> {
        let key = keys::id_key(report_id.to_bytes());
        let _guard = self.lock(cf::REPORTS, &key);

        let report: Report = self
            .get_doc(cf::REPORTS, &key)?
            .ok_or_else(|| ForumError::not_found("report", report_id))?;

        let cf_reports = self.cf(cf::REPORTS)?;
        let cf_by_comment = self.cf(cf::REPORTS_BY_COMMENT)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_reports, &key);
        batch.delete_cf(
            &cf_by_comment,
            keys::comment_report_key(&report.comment_id, report_id),
        );
        self.db.write(batch)?;

        Ok(())
    }

    // =========================================================================
    // Payment Operations
    // =========================================================================

    fn record_payment(&self, payment: &Payment) -> Result<User> {
        let cf_payments = self.cf(cf::PAYMENTS)?;
        let payment_key = keys::id_key(payment.id.to_bytes());
        let payment_value = Self::serialize(payment)?;

        let (user, ()) = self.update_doc(
            cf::USERS,
            &keys::user_key(&payment.email),
            "user",
            &payment.email,
            |user: &mut User, batch| {
                user.badge = Badge::Gold;
                batch.put_cf(&cf_payments, &payment_key, &payment_value);
                Ok(())
            },
        )?;

        tracing::info!(
            payment_id = %payment.id,
            email = %payment.email,
            amount_cents = payment.amount_cents,
            "payment recorded"
        );
        Ok(user)
    }

    fn list_payments(&self, email: Option<&Email>) -> Result<Vec<Payment>> {
        let payments: Vec<Payment> = self.scan(cf::PAYMENTS, true)?;

        Ok(payments
            .into_iter()
            .filter(|p| email.map_or(true, |e| &p.email == e))
            .collect())
    }

    // =========================================================================
    // Friend Relation Operations
    // =========================================================================

    fn create_friend_request(&self, request: &FriendRequest) -> Result<()> {
        let pair_key = keys::friend_pair_key(&request.pair());
        let _guard = self.lock(cf::FRIEND_PAIRS, &pair_key);

        if self.exists(cf::FRIEND_PAIRS, &pair_key)? {
            return Err(ForumError::Conflict("already requested".into()).into());
        }

        let cf_requests = self.cf(cf::FRIEND_REQUESTS)?;
        let cf_pairs = self.cf(cf::FRIEND_PAIRS)?;
        let cf_by_user = self.cf(cf::FRIEND_REQUESTS_BY_USER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_requests,
            keys::id_key(request.id.to_bytes()),
            Self::serialize(request)?,
        );
        batch.put_cf(&cf_pairs, &pair_key, request.id.to_bytes());
        batch.put_cf(
            &cf_by_user,
            keys::user_friend_request_key(&request.from_user, &request.id),
            [],
        );
        batch.put_cf(
            &cf_by_user,
            keys::user_friend_request_key(&request.to_user, &request.id),
            [],
        );
        self.db.write(batch)?;

        tracing::info!(
            request_id = %request.id,
            from = %request.from_user,
            to = %request.to_user,
            "friend request sent"
        );
        Ok(())
    }

    fn get_friend_request(&self, request_id: &FriendRequestId) -> Result<Option<FriendRequest>> {
        self.get_doc(cf::FRIEND_REQUESTS, &keys::id_key(request_id.to_bytes()))
    }

    fn respond_friend_request(
        &self,
        request_id: &FriendRequestId,
        responder: &Email,
        status: FriendStatus,
    ) -> Result<FriendRequest> {
        let key = keys::id_key(request_id.to_bytes());
        let (request, ()) = self.update_doc(
            cf::FRIEND_REQUESTS,
            &key,
            "friend request",
            request_id,
            |request: &mut FriendRequest, _| Ok(request.respond(responder, status)?),
        )?;

        tracing::info!(request_id = %request_id, status = %status, "friend request answered");
        Ok(request)
    }

    fn incoming_friend_requests(
        &self,
        email: &Email,
        status: Option<FriendStatus>,
    ) -> Result<Vec<FriendRequest>> {
        Ok(self
            .friend_requests_of(email)?
            .into_iter()
            .filter(|r| &r.to_user == email)
            .filter(|r| status.map_or(true, |s| r.status == s))
            .collect())
    }

    fn friends_of(&self, email: &Email) -> Result<Vec<FriendRequest>> {
        Ok(self
            .friend_requests_of(email)?
            .into_iter()
            .filter(|r| r.status == FriendStatus::Accept)
            .collect())
    }

    // =========================================================================
    // Group Operations
    // =========================================================================

    fn create_group(&self, group: &Group) -> Result<()> {
        let name_key = keys::group_name_key(&group.name);
        let _guard = self.lock(cf::GROUP_NAMES, &name_key);

        if self.exists(cf::GROUP_NAMES, &name_key)? {
            return Err(ForumError::Conflict("group name already exists".into()).into());
        }

        let cf_groups = self.cf(cf::GROUPS)?;
        let cf_names = self.cf(cf::GROUP_NAMES)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_groups,
            keys::id_key(group.id.to_bytes()),
            Self::serialize(group)?,
        );
        batch.put_cf(&cf_names, &name_key, group.id.to_bytes());
        self.db.write(batch)?;

        tracing::info!(group_id = %group.id, name = %group.name, owner = %group.owner_email, "group created");
        Ok(())
    }

    fn get_group(&self, group_id: &GroupId) -> Result<Option<Group>> {
        self.get_doc(cf::GROUPS, &keys::id_key(group_id.to_bytes()))
    }

    fn list_groups(&self, name: Option<&TextFilter>, window: Window) -> Result<Page<Group>> {
        let groups: Vec<Group> = self.scan(cf::GROUPS, true)?;
        let matched = groups
            .into_iter()
            .filter(|g| name.map_or(true, |f| f.matches(&g.name)))
            .collect();

        Ok(Page::from_filtered(matched, window))
    }

    fn submit_join_request(&self, group_id: &GroupId, email: &Email) -> Result<Group> {
        let key = keys::id_key(group_id.to_bytes());
        let (group, ()) = self.update_doc(cf::GROUPS, &key, "group", group_id, |group: &mut Group, _| {
            Ok(group.submit_join_request(email, Utc::now())?)
        })?;

        tracing::info!(group_id = %group_id, email = %email, "join request submitted");
        Ok(group)
    }

    fn respond_to_join_request(
        &self,
        group_id: &GroupId,
        responder: &Email,
        email: &Email,
        action: JoinAction,
    ) -> Result<Group> {
        let key = keys::id_key(group_id.to_bytes());
        let (group, ()) = self.update_doc(cf::GROUPS, &key, "group", group_id, |group: &mut Group, _| {
            Ok(group.respond_to_join_request(responder, email, action, Utc::now())?)
        })?;

        tracing::info!(group_id = %group_id, email = %email, action = %action, "join request answered");
        Ok(group)
    }

    fn set_member_role(
        &self,
        group_id: &GroupId,
        actor: &Email,
        email: &Email,
        role: GroupRole,
    ) -> Result<Group> {
        let key = keys::id_key(group_id.to_bytes());
        let (group, ()) = self.update_doc(cf::GROUPS, &key, "group", group_id, |group: &mut Group, _| {
            Ok(group.set_member_role(actor, email, role)?)
        })?;

        tracing::info!(group_id = %group_id, email = %email, role = ?role, "member role changed");
        Ok(group)
    }

    fn delete_group(&self, group_id: &GroupId, requester: &Email) -> Result<()> {
        let key = keys::id_key(group_id.to_bytes());
        let _guard = self.lock(cf::GROUPS, &key);

        let group: Group = self
            .get_doc(cf::GROUPS, &key)?
            .ok_or_else(|| ForumError::not_found("group", group_id))?;
        group.ensure_owner(requester)?;

        let cf_groups = self.cf(cf::GROUPS)?;
        let cf_names = self.cf(cf::GROUP_NAMES)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_groups, &key);
        batch.delete_cf(&cf_names, keys::group_name_key(&group.name));
        self.db.write(batch)?;

        tracing::info!(group_id = %group_id, "group deleted");
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    fn flush(&self) -> Result<()> {
        for name in all_column_families() {
            let cf = self.cf(name)?;
            self.db.flush_cf(&cf)?;
        }
        Ok(())
    }
}
