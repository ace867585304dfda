//! Groups and the membership workflow.
//!
//! A group is created with its owner as the first member (role `admin`).
//! Other users file join requests; the owner accepts (the request moves into
//! `members`) or rejects (the request is dropped). An email is never in both
//! `members` and `requests`, and every transition below checks that before it
//! mutates anything.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ForumError, Result};
use crate::{Email, GroupId};

/// Maximum group name length in characters.
pub const MAX_GROUP_NAME_CHARS: usize = 80;

/// A user group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier.
    pub id: GroupId,

    /// Display name, unique case-insensitively.
    pub name: String,

    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,

    /// Owner; always the first member, with role `admin`.
    pub owner_email: Email,

    /// Members in join order.
    pub members: Vec<GroupMember>,

    /// Pending join requests in arrival order.
    pub requests: Vec<JoinRequest>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A group member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Member email.
    pub email: Email,
    /// Role inside the group.
    pub role: GroupRole,
    /// When the member joined.
    pub joined_at: DateTime<Utc>,
}

/// A pending join request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Requesting email.
    pub email: Email,
    /// When the request was filed.
    pub requested_at: DateTime<Utc>,
}

/// Role of a member inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    /// Group administrator.
    Admin,
    /// Regular member.
    Member,
}

impl FromStr for GroupRole {
    type Err = ForumError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(ForumError::InvalidArgument(format!(
                "unknown group role: {other:?}"
            ))),
        }
    }
}

/// Owner's decision on a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinAction {
    /// Move the request into `members`.
    Accept,
    /// Drop the request.
    Reject,
}

impl FromStr for JoinAction {
    type Err = ForumError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "accept" => Ok(Self::Accept),
            "reject" => Ok(Self::Reject),
            other => Err(ForumError::InvalidArgument(format!(
                "unknown join request action: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for JoinAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        })
    }
}

/// Which list of a group to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRoster {
    /// Current members.
    Members,
    /// Pending join requests.
    Requests,
}

impl Group {
    /// Create a group seeded with its owner as admin.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::InvalidArgument` for a blank or overlong name.
    pub fn new(
        name: &str,
        description: Option<String>,
        owner_email: Email,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ForumError::InvalidArgument("group name is empty".into()));
        }
        if name.chars().count() > MAX_GROUP_NAME_CHARS {
            return Err(ForumError::InvalidArgument(format!(
                "group name longer than {MAX_GROUP_NAME_CHARS} characters"
            )));
        }

        Ok(Self {
            id: GroupId::generate(),
            name: name.to_string(),
            description: description.filter(|d| !d.trim().is_empty()),
            members: vec![GroupMember {
                email: owner_email.clone(),
                role: GroupRole::Admin,
                joined_at: created_at,
            }],
            owner_email,
            requests: Vec::new(),
            created_at,
        })
    }

    /// Case-insensitive uniqueness key for a group name.
    #[must_use]
    pub fn name_key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Whether `email` is a member.
    #[must_use]
    pub fn is_member(&self, email: &Email) -> bool {
        self.members.iter().any(|m| &m.email == email)
    }

    /// Whether `email` has a pending join request.
    #[must_use]
    pub fn has_requested(&self, email: &Email) -> bool {
        self.requests.iter().any(|r| &r.email == email)
    }

    /// Fail unless `email` owns the group.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::Forbidden` for anyone but the owner.
    pub fn ensure_owner(&self, email: &Email) -> Result<()> {
        if &self.owner_email == email {
            Ok(())
        } else {
            Err(ForumError::Forbidden("only the group owner can do this".into()))
        }
    }

    /// File a join request for `email`.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::Conflict` if `email` already asked or already belongs.
    pub fn submit_join_request(&mut self, email: &Email, now: DateTime<Utc>) -> Result<()> {
        if self.has_requested(email) {
            return Err(ForumError::Conflict("already requested".into()));
        }
        if self.is_member(email) {
            return Err(ForumError::Conflict("already a member".into()));
        }

        self.requests.push(JoinRequest {
            email: email.clone(),
            requested_at: now,
        });
        Ok(())
    }

    /// Apply the owner's decision on `email`'s request.
    ///
    /// Accepting removes the request and appends a `member` entry in the same
    /// mutation; rejecting only removes the request.
    ///
    /// # Errors
    ///
    /// - `ForumError::Forbidden` if `responder` is not the owner.
    /// - `ForumError::NotFound` if `email` has no pending request.
    pub fn respond_to_join_request(
        &mut self,
        responder: &Email,
        email: &Email,
        action: JoinAction,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_owner(responder)?;

        let position = self
            .requests
            .iter()
            .position(|r| &r.email == email)
            .ok_or_else(|| ForumError::not_found("join request", email))?;
        self.requests.remove(position);

        if action == JoinAction::Accept && !self.is_member(email) {
            self.members.push(GroupMember {
                email: email.clone(),
                role: GroupRole::Member,
                joined_at: now,
            });
        }
        Ok(())
    }

    /// Change a member's role.
    ///
    /// # Errors
    ///
    /// - `ForumError::Forbidden` if `actor` is not the owner.
    /// - `ForumError::NotFound` if `email` is not a member.
    /// - `ForumError::Conflict` when targeting the owner, who stays admin.
    pub fn set_member_role(&mut self, actor: &Email, email: &Email, role: GroupRole) -> Result<()> {
        self.ensure_owner(actor)?;
        if email == &self.owner_email {
            return Err(ForumError::Conflict("the owner's role cannot be changed".into()));
        }

        let member = self
            .members
            .iter_mut()
            .find(|m| &m.email == email)
            .ok_or_else(|| ForumError::not_found("group member", email))?;
        member.role = role;
        Ok(())
    }

    /// Emails on the requested roster.
    #[must_use]
    pub fn roster(&self, which: GroupRoster) -> Vec<&Email> {
        match which {
            GroupRoster::Members => self.members.iter().map(|m| &m.email).collect(),
            GroupRoster::Requests => self.requests.iter().map(|r| &r.email).collect(),
        }
    }

    /// Owner is an admin member and no email is both member and requester.
    #[must_use]
    pub fn invariants_hold(&self) -> bool {
        let owner_is_admin = self
            .members
            .iter()
            .any(|m| m.email == self.owner_email && m.role == GroupRole::Admin);
        owner_is_admin && !self.requests.iter().any(|r| self.is_member(&r.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    fn chess_club() -> Group {
        Group::new("Chess Club", None, email("alice@x.com"), Utc::now()).unwrap()
    }

    #[test]
    fn owner_is_seeded_as_admin() {
        let group = chess_club();
        assert_eq!(group.members.len(), 1);
        assert_eq!(group.members[0].email, email("alice@x.com"));
        assert_eq!(group.members[0].role, GroupRole::Admin);
        assert!(group.requests.is_empty());
        assert!(group.invariants_hold());
    }

    #[test]
    fn chess_club_scenario() {
        let mut group = chess_club();
        let alice = email("alice@x.com");
        let bob = email("bob@x.com");

        group.submit_join_request(&bob, Utc::now()).unwrap();
        assert_eq!(group.roster(GroupRoster::Requests), vec![&bob]);

        group
            .respond_to_join_request(&alice, &bob, JoinAction::Accept, Utc::now())
            .unwrap();

        assert!(group.requests.is_empty());
        assert_eq!(group.members.len(), 2);
        assert_eq!(group.members[0].role, GroupRole::Admin);
        assert_eq!(group.members[1].email, bob);
        assert_eq!(group.members[1].role, GroupRole::Member);
        assert!(group.invariants_hold());
    }

    #[test]
    fn duplicate_requests_and_members_conflict() {
        let mut group = chess_club();
        let bob = email("bob@x.com");
        group.submit_join_request(&bob, Utc::now()).unwrap();

        let again = group.submit_join_request(&bob, Utc::now());
        assert_eq!(again, Err(ForumError::Conflict("already requested".into())));

        let owner = group.submit_join_request(&email("alice@x.com"), Utc::now());
        assert_eq!(owner, Err(ForumError::Conflict("already a member".into())));
    }

    #[test]
    fn reject_only_drops_the_request() {
        let mut group = chess_club();
        let bob = email("bob@x.com");
        group.submit_join_request(&bob, Utc::now()).unwrap();
        group
            .respond_to_join_request(&email("alice@x.com"), &bob, JoinAction::Reject, Utc::now())
            .unwrap();
        assert!(group.requests.is_empty());
        assert!(!group.is_member(&bob));
    }

    #[test]
    fn non_owner_cannot_respond() {
        let mut group = chess_club();
        let bob = email("bob@x.com");
        group.submit_join_request(&bob, Utc::now()).unwrap();

        let result = group.respond_to_join_request(&bob, &bob, JoinAction::Accept, Utc::now());
        assert!(matches!(result, Err(ForumError::Forbidden(_))));
        assert!(group.has_requested(&bob));
    }

    #[test]
    fn responding_without_request_is_not_found() {
        let mut group = chess_club();
        let result = group.respond_to_join_request(
            &email("alice@x.com"),
            &email("carol@x.com"),
            JoinAction::Accept,
            Utc::now(),
        );
        assert!(matches!(result, Err(ForumError::NotFound { .. })));
        assert_eq!(group.members.len(), 1);
    }

    #[test]
    fn role_assignment_is_owner_only() {
        let mut group = chess_club();
        let alice = email("alice@x.com");
        let bob = email("bob@x.com");
        group.submit_join_request(&bob, Utc::now()).unwrap();
        group
            .respond_to_join_request(&alice, &bob, JoinAction::Accept, Utc::now())
            .unwrap();

        assert!(matches!(
            group.set_member_role(&bob, &bob, GroupRole::Admin),
            Err(ForumError::Forbidden(_))
        ));
        assert!(matches!(
            group.set_member_role(&alice, &alice, GroupRole::Member),
            Err(ForumError::Conflict(_))
        ));

        group.set_member_role(&alice, &bob, GroupRole::Admin).unwrap();
        assert_eq!(group.members[1].role, GroupRole::Admin);
    }

    #[test]
    fn blank_names_are_rejected() {
        let result = Group::new("   ", None, email("a@x.com"), Utc::now());
        assert!(matches!(result, Err(ForumError::InvalidArgument(_))));
    }

    #[test]
    fn action_parsing() {
        assert_eq!("accept".parse::<JoinAction>().unwrap(), JoinAction::Accept);
        assert!(matches!(
            "maybe".parse::<JoinAction>(),
            Err(ForumError::InvalidArgument(_))
        ));
    }
}
