//! Identifier types for guild documents.
//!
//! Every stored document except users (keyed by [`Email`]) and tags carries a
//! ULID identifier. Identifiers come from one process-wide monotonic
//! generator, so iterating a column family in key order yields documents in
//! creation order, including documents created within the same millisecond.
//!
//! # Macro-based ID Types
//!
//! The `ulid_id_type!` macro reduces boilerplate for the identifier newtypes,
//! ensuring consistent implementation of serialization, parsing, and display traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock, PoisonError};
use ulid::{Generator, Ulid};

/// Next ULID from the shared generator. Within one millisecond the random part
/// is incremented, so later calls always sort after earlier ones.
fn next_ulid() -> Ulid {
    static GENERATOR: OnceLock<Mutex<Generator>> = OnceLock::new();
    let mut generator = GENERATOR
        .get_or_init(|| Mutex::new(Generator::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    // Overflow needs 2^80 ids in one millisecond.
    generator.generate().unwrap_or_else(|_| Ulid::new())
}

/// Macro to define a ULID-based identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `ulid::Ulid` with implementations for:
/// - `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Serialize`, `Deserialize` (as string)
/// - `FromStr`, `Display`, `Debug`
/// - `TryFrom<String>`, `Into<String>`
///
/// # Example
///
/// ```ignore
/// ulid_id_type!(MyId, "A custom identifier type.");
/// let id = MyId::generate();
/// let parsed: MyId = id.to_string().parse().unwrap();
/// ```
macro_rules! ulid_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Ulid);

        impl $name {
            /// Create an identifier from a ULID.
            #[must_use]
            pub const fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            /// Generate a new identifier stamped with the current time, ordered
            /// after every identifier generated before it in this process.
            #[must_use]
            pub fn generate() -> Self {
                Self(next_ulid())
            }

            /// Return the bytes of the ULID (16 bytes, big-endian, time first).
            #[must_use]
            pub fn to_bytes(&self) -> [u8; 16] {
                self.0.to_bytes()
            }

            /// Create an identifier from its 16 stored bytes.
            #[must_use]
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Ulid::from_bytes(bytes))
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let ulid = Ulid::from_string(s.trim()).map_err(|_| IdError::InvalidUlid)?;
                Ok(Self(ulid))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }
    };
}

ulid_id_type!(PostId, "A post identifier.");
ulid_id_type!(CommentId, "A comment identifier.\n\nReports reference comments through this type, so a malformed reference is rejected when it is parsed rather than during the report join.");
ulid_id_type!(ReportId, "An abuse report identifier.");
ulid_id_type!(FriendRequestId, "A friend relation identifier.");
ulid_id_type!(GroupId, "A group identifier.");
ulid_id_type!(AnnouncementId, "An announcement identifier.");
ulid_id_type!(PaymentId, "A recorded payment identifier.");

/// A user's email address, the identity key of every user.
///
/// Stored lowercase so that lookups and set membership are case-insensitive.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Parse and normalize an email address.
    ///
    /// # Errors
    ///
    /// Returns `IdError::InvalidEmail` unless the input has exactly one `@`
    /// with a non-empty local part and domain and no whitespace or control
    /// characters.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let trimmed = raw.trim();
        let mut parts = trimmed.split('@');
        let valid = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !trimmed
                        .chars()
                        .any(|c| c.is_whitespace() || c.is_control())
            }
            _ => false,
        };

        if !valid {
            return Err(IdError::InvalidEmail(raw.to_string()));
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    /// The normalized address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bytes used as a storage key.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for Email {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Email({})", self.0)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,

    /// The input is not a usable email address.
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_id_roundtrip() {
        let id = PostId::generate();
        let parsed = PostId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn comment_id_serde_json() {
        let id = CommentId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: CommentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn malformed_id_is_rejected() {
        assert_eq!(CommentId::from_str("not-an-id"), Err(IdError::InvalidUlid));
        assert!(serde_json::from_str::<ReportId>("\"507f1f77bcf86cd799439011\"").is_err());
    }

    #[test]
    fn ids_sort_by_creation_time() {
        let first = GroupId::from_ulid(Ulid::from_parts(1_000, 7));
        let second = GroupId::from_ulid(Ulid::from_parts(2_000, 1));
        assert!(first < second);
        assert!(first.to_bytes() < second.to_bytes());
        assert_eq!(GroupId::from_bytes(second.to_bytes()), second);
    }

    #[test]
    fn generated_ids_increase_within_a_millisecond() {
        let ids: Vec<ReportId> = (0..1000).map(|_| ReportId::generate()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(ids
            .windows(2)
            .all(|pair| pair[0].to_bytes() < pair[1].to_bytes()));
    }

    #[test]
    fn email_is_normalized() {
        let email = Email::parse("  Alice@X.com ").unwrap();
        assert_eq!(email.as_str(), "alice@x.com");
        assert_eq!(email, Email::parse("alice@x.com").unwrap());
    }

    #[test]
    fn email_rejects_garbage() {
        for raw in ["", "alice", "@x.com", "alice@", "a@b@c", "al ice@x.com"] {
            assert!(Email::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }
}
