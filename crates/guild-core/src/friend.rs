//! Friend-request state machine.
//!
//! ```text
//! pending ──accept──▶ accept
//!    └─────reject──▶ reject
//! ```
//!
//! Both end states are terminal, and a relation in any state blocks a new
//! request between the same two people in either direction.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ForumError, Result};
use crate::{Email, FriendRequestId};

/// A friend relation between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    /// Relation identifier.
    pub id: FriendRequestId,

    /// Requester.
    pub from_user: Email,

    /// Recipient, the only party allowed to respond.
    pub to_user: Email,

    /// Current state.
    pub status: FriendStatus,

    /// When the request was sent.
    pub created_at: DateTime<Utc>,

    /// When the recipient responded.
    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,
}

impl FriendRequest {
    /// Open a pending request.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::InvalidArgument` when `from` and `to` are the same user.
    pub fn new(from_user: Email, to_user: Email) -> Result<Self> {
        if from_user == to_user {
            return Err(ForumError::InvalidArgument(
                "cannot send a friend request to yourself".into(),
            ));
        }

        Ok(Self {
            id: FriendRequestId::generate(),
            from_user,
            to_user,
            status: FriendStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
        })
    }

    /// The unordered pair this relation occupies.
    #[must_use]
    pub fn pair(&self) -> FriendPair {
        FriendPair::new(&self.from_user, &self.to_user)
    }

    /// Move out of `pending`.
    ///
    /// # Errors
    ///
    /// - `ForumError::Forbidden` if `responder` is not the recipient.
    /// - `ForumError::Conflict` if the request was already answered.
    /// - `ForumError::InvalidArgument` if `status` is `pending`.
    pub fn respond(&mut self, responder: &Email, status: FriendStatus) -> Result<()> {
        if responder != &self.to_user {
            return Err(ForumError::Forbidden(
                "only the recipient can answer a friend request".into(),
            ));
        }
        if status == FriendStatus::Pending {
            return Err(ForumError::InvalidArgument(
                "a response must be accept or reject".into(),
            ));
        }
        if self.status != FriendStatus::Pending {
            return Err(ForumError::Conflict(format!(
                "friend request already answered: {}",
                self.status
            )));
        }

        self.status = status;
        self.responded_at = Some(Utc::now());
        Ok(())
    }

    /// The party that is not `email`, if `email` is part of this relation.
    #[must_use]
    pub fn other_party(&self, email: &Email) -> Option<&Email> {
        if &self.from_user == email {
            Some(&self.to_user)
        } else if &self.to_user == email {
            Some(&self.from_user)
        } else {
            None
        }
    }
}

/// State of a friend relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendStatus {
    /// Waiting for the recipient.
    Pending,
    /// Accepted (terminal).
    Accept,
    /// Rejected (terminal).
    Reject,
}

impl FromStr for FriendStatus {
    type Err = ForumError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "accept" | "accepted" => Ok(Self::Accept),
            "reject" | "rejected" => Ok(Self::Reject),
            other => Err(ForumError::InvalidArgument(format!(
                "unknown friend request status: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for FriendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Accept => "accept",
            Self::Reject => "reject",
        })
    }
}

/// Order-independent key for the two parties of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FriendPair {
    low: Email,
    high: Email,
}

impl FriendPair {
    /// Build the pair; `new(a, b) == new(b, a)`.
    #[must_use]
    pub fn new(a: &Email, b: &Email) -> Self {
        if a <= b {
            Self {
                low: a.clone(),
                high: b.clone(),
            }
        } else {
            Self {
                low: b.clone(),
                high: a.clone(),
            }
        }
    }

    /// The two emails in canonical order.
    #[must_use]
    pub fn parts(&self) -> (&Email, &Email) {
        (&self.low, &self.high)
    }
}
