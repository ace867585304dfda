//! Key encoding utilities for `RocksDB`.
//!
//! Document ids are ULIDs stored as their 16 raw bytes. Composite index keys
//! put the variable-length part first, terminated by `0x00` (which a valid
//! [`Email`] never contains), and the fixed 16-byte id last.

use guild_core::{CommentId, Email, FriendPair, FriendRequestId, Group, ReportId};

const SEPARATOR: u8 = 0x00;
const ID_LEN: usize = 16;

/// Create a user key from an email.
#[must_use]
pub fn user_key(email: &Email) -> Vec<u8> {
    email.as_bytes().to_vec()
}

/// Create a document key from an id's bytes.
#[must_use]
pub fn id_key(bytes: [u8; ID_LEN]) -> Vec<u8> {
    bytes.to_vec()
}

/// Create a report-by-comment index key.
///
/// Format: `comment_id (16 bytes) || report_id (16 bytes)`
#[must_use]
pub fn comment_report_key(comment_id: &CommentId, report_id: &ReportId) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 * ID_LEN);
    key.extend_from_slice(&comment_id.to_bytes());
    key.extend_from_slice(&report_id.to_bytes());
    key
}

/// Create a prefix for iterating all reports filed against a comment.
#[must_use]
pub fn comment_reports_prefix(comment_id: &CommentId) -> Vec<u8> {
    comment_id.to_bytes().to_vec()
}

/// Create the uniqueness key of an unordered friend pair.
///
/// Format: `low_email || 0x00 || high_email`
#[must_use]
pub fn friend_pair_key(pair: &FriendPair) -> Vec<u8> {
    let (low, high) = pair.parts();
    let mut key = Vec::with_capacity(low.as_bytes().len() + high.as_bytes().len() + 1);
    key.extend_from_slice(low.as_bytes());
    key.push(SEPARATOR);
    key.extend_from_slice(high.as_bytes());
    key
}

/// Create a relation-by-party index key.
///
/// Format: `email || 0x00 || request_id (16 bytes)`
#[must_use]
pub fn user_friend_request_key(email: &Email, request_id: &FriendRequestId) -> Vec<u8> {
    let mut key = user_friend_requests_prefix(email);
    key.extend_from_slice(&request_id.to_bytes());
    key
}

/// Create a prefix for iterating all relations of one party.
#[must_use]
pub fn user_friend_requests_prefix(email: &Email) -> Vec<u8> {
    let mut key = Vec::with_capacity(email.as_bytes().len() + 1 + ID_LEN);
    key.extend_from_slice(email.as_bytes());
    key.push(SEPARATOR);
    key
}

/// Extract the trailing 16-byte id from a composite index key.
#[must_use]
pub fn trailing_id(key: &[u8]) -> Option<[u8; ID_LEN]> {
    key.len()
        .checked_sub(ID_LEN)
        .and_then(|start| key[start..].try_into().ok())
}

/// Create the uniqueness key of a group name.
#[must_use]
pub fn group_name_key(name: &str) -> Vec<u8> {
    Group::name_key(name).into_bytes()
}

/// Create a tag key from its case-folded name.
#[must_use]
pub fn tag_key(key: &str) -> Vec<u8> {
    key.as_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    #[test]
    fn comment_report_key_format() {
        let comment_id = CommentId::generate();
        let report_id = ReportId::generate();
        let key = comment_report_key(&comment_id, &report_id);

        assert_eq!(key.len(), 32);
        assert!(key.starts_with(&comment_reports_prefix(&comment_id)));
        assert_eq!(trailing_id(&key), Some(report_id.to_bytes()));
    }

    #[test]
    fn friend_pair_key_is_direction_free() {
        let a = email("a@x.com");
        let b = email("b@x.com");
        assert_eq!(
            friend_pair_key(&FriendPair::new(&a, &b)),
            friend_pair_key(&FriendPair::new(&b, &a))
        );
        assert_eq!(friend_pair_key(&FriendPair::new(&a, &b)), b"a@x.com\0b@x.com".to_vec());
    }

    #[test]
    fn user_prefixes_do_not_overlap() {
        let id = FriendRequestId::generate();
        let key = user_friend_request_key(&email("ab@x.com"), &id);
        assert!(!key.starts_with(&user_friend_requests_prefix(&email("ab@x.co"))));
        assert!(key.starts_with(&user_friend_requests_prefix(&email("ab@x.com"))));
        assert_eq!(trailing_id(&key), Some(id.to_bytes()));
    }

    #[test]
    fn group_names_fold_case() {
        assert_eq!(group_name_key(" Chess Club "), group_name_key("chess club"));
    }

    #[test]
    fn short_keys_have_no_trailing_id() {
        assert_eq!(trailing_id(b"short"), None);
    }
}
