//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Email;

/// A forum member, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identity key (unique, immutable).
    pub email: Email,

    /// Display name.
    pub name: String,

    /// Avatar URL, if the identity provider supplied one.
    #[serde(default)]
    pub photo_url: Option<String>,

    /// Privilege level.
    #[serde(default)]
    pub role: Role,

    /// Set once an admin has warned the user.
    #[serde(default)]
    pub warned: bool,

    /// Paid tier marker.
    #[serde(default)]
    pub badge: Badge,

    /// When the user first signed in.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a regular member with no badge.
    #[must_use]
    pub fn new(email: Email, name: impl Into<String>, photo_url: Option<String>) -> Self {
        Self {
            email,
            name: name.into(),
            photo_url,
            role: Role::Member,
            warned: false,
            badge: Badge::None,
            created_at: Utc::now(),
        }
    }

    /// Whether the user holds the elevated role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Privilege level of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular member.
    #[default]
    Member,

    /// Moderator with access to every admin endpoint.
    Admin,
}

/// Paid tier marker, granted after a successful payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    /// No payment recorded.
    #[default]
    None,

    /// Paid member.
    Gold,
}
