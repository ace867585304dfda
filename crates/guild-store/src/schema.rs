//! Database schema definitions and column families.
//!
//! One column family per collection, plus index families whose values are
//! empty or a bare document id.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Users, keyed by normalized email.
    pub const USERS: &str = "users";

    /// Posts, keyed by `post_id` (ULID, so key order is creation order).
    pub const POSTS: &str = "posts";

    /// Comments, keyed by `comment_id`.
    pub const COMMENTS: &str = "comments";

    /// Abuse reports, keyed by `report_id`.
    pub const REPORTS: &str = "reports";

    /// Index: reports by comment, keyed by `comment_id || report_id`.
    /// Value is empty (index only).
    pub const REPORTS_BY_COMMENT: &str = "reports_by_comment";

    /// Friend relations, keyed by `request_id`.
    pub const FRIEND_REQUESTS: &str = "friend_requests";

    /// Uniqueness index: one relation per unordered pair, keyed by
    /// `low_email || 0x00 || high_email`. Value is the `request_id`.
    pub const FRIEND_PAIRS: &str = "friend_pairs";

    /// Index: relations by party, keyed by `email || 0x00 || request_id`.
    /// Value is empty (index only).
    pub const FRIEND_REQUESTS_BY_USER: &str = "friend_requests_by_user";

    /// Groups, keyed by `group_id`.
    pub const GROUPS: &str = "groups";

    /// Uniqueness index: lowercase group name to `group_id`.
    pub const GROUP_NAMES: &str = "group_names";

    /// Announcements, keyed by `announcement_id`.
    pub const ANNOUNCEMENTS: &str = "announcements";

    /// Tags, keyed by lowercase name.
    pub const TAGS: &str = "tags";

    /// Payments, keyed by `payment_id`.
    pub const PAYMENTS: &str = "payments";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::USERS,
        cf::POSTS,
        cf::COMMENTS,
        cf::REPORTS,
        cf::REPORTS_BY_COMMENT,
        cf::FRIEND_REQUESTS,
        cf::FRIEND_PAIRS,
        cf::FRIEND_REQUESTS_BY_USER,
        cf::GROUPS,
        cf::GROUP_NAMES,
        cf::ANNOUNCEMENTS,
        cf::TAGS,
        cf::PAYMENTS,
    ]
}
