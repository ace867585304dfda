//! Append-mostly records: announcements, tags, and payments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AnnouncementId, Email, PaymentId};

/// A site-wide announcement posted by an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Announcement identifier.
    pub id: AnnouncementId,
    /// Admin who posted it.
    pub author_email: Email,
    /// Headline.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Announcement {
    /// Create an announcement stamped now.
    #[must_use]
    pub fn new(author_email: Email, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: AnnouncementId::generate(),
            author_email,
            title: title.into(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}

/// A post tag offered to authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag label as entered.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Create a tag; the label is trimmed.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            created_at: Utc::now(),
        }
    }

    /// Case-insensitive uniqueness key.
    #[must_use]
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// A completed payment. Recording one grants the payer the gold badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment identifier.
    pub id: PaymentId,
    /// Payer.
    pub email: Email,
    /// Amount charged, in cents.
    pub amount_cents: i64,
    /// Processor-side transaction reference.
    pub transaction_id: String,
    /// When the payment was recorded.
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Record a payment stamped now.
    #[must_use]
    pub fn new(email: Email, amount_cents: i64, transaction_id: impl Into<String>) -> Self {
        Self {
            id: PaymentId::generate(),
            email,
            amount_cents,
            transaction_id: transaction_id.into(),
            created_at: Utc::now(),
        }
    }
}
