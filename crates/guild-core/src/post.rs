//! Posts and the vote engine.
//!
//! A post tracks its voters in two disjoint sets and keeps a counter next to
//! each set. [`Post::apply_vote`] is the only mutation of those four fields,
//! and every branch changes a set and its counter together, so
//! `up_vote == voted_by.up_voters.len()` holds after any sequence of votes.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ForumError;
use crate::{Email, PostId};

/// A forum post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post identifier.
    pub id: PostId,

    /// Author (immutable).
    pub author_email: Email,

    /// Author display name at the time of posting.
    #[serde(default)]
    pub author_name: String,

    /// Title.
    pub title: String,

    /// Body text.
    pub body: String,

    /// Topic tag, searched case-insensitively.
    pub tag: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Number of up votes.
    pub up_vote: u64,

    /// Number of down votes.
    pub down_vote: u64,

    /// Who voted which way.
    #[serde(default)]
    pub voted_by: VotedBy,
}

/// Voter sets of a post. A voter is in at most one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotedBy {
    /// Emails that voted up.
    pub up_voters: BTreeSet<Email>,

    /// Emails that voted down.
    pub down_voters: BTreeSet<Email>,
}

impl Post {
    /// Create a post with no votes.
    #[must_use]
    pub fn new(
        author_email: Email,
        author_name: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            id: PostId::generate(),
            author_email,
            author_name: author_name.into(),
            title: title.into(),
            body: body.into(),
            tag: tag.into(),
            created_at: Utc::now(),
            up_vote: 0,
            down_vote: 0,
            voted_by: VotedBy::default(),
        }
    }

    /// Popularity score: up votes minus down votes.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn popularity(&self) -> i64 {
        self.up_vote as i64 - self.down_vote as i64
    }

    /// The direction `voter` currently holds, if any.
    #[must_use]
    pub fn vote_of(&self, voter: &Email) -> Option<VoteType> {
        if self.voted_by.up_voters.contains(voter) {
            Some(VoteType::Up)
        } else if self.voted_by.down_voters.contains(voter) {
            Some(VoteType::Down)
        } else {
            None
        }
    }

    /// Apply a vote as one compound update of both sets and both counters.
    ///
    /// Repeating a vote is a no-op that reports [`VoteOutcome::AlreadyVoted`];
    /// voting the other way moves the voter between sets.
    pub fn apply_vote(&mut self, voter: &Email, vote: VoteType) -> VoteOutcome {
        match (self.vote_of(voter), vote) {
            (Some(current), requested) if current == requested => {
                VoteOutcome::AlreadyVoted(requested)
            }
            (Some(_), VoteType::Up) => {
                self.voted_by.down_voters.remove(voter);
                self.down_vote = self.down_vote.saturating_sub(1);
                self.voted_by.up_voters.insert(voter.clone());
                self.up_vote += 1;
                VoteOutcome::Switched(VoteType::Up)
            }
            (Some(_), VoteType::Down) => {
                self.voted_by.up_voters.remove(voter);
                self.up_vote = self.up_vote.saturating_sub(1);
                self.voted_by.down_voters.insert(voter.clone());
                self.down_vote += 1;
                VoteOutcome::Switched(VoteType::Down)
            }
            (None, VoteType::Up) => {
                self.voted_by.up_voters.insert(voter.clone());
                self.up_vote += 1;
                VoteOutcome::Cast(VoteType::Up)
            }
            (None, VoteType::Down) => {
                self.voted_by.down_voters.insert(voter.clone());
                self.down_vote += 1;
                VoteOutcome::Cast(VoteType::Down)
            }
        }
    }

    /// Whether counters agree with the voter sets and the sets are disjoint.
    #[must_use]
    pub fn votes_consistent(&self) -> bool {
        let counts_match = self.up_vote == self.voted_by.up_voters.len() as u64
            && self.down_vote == self.voted_by.down_voters.len() as u64;
        counts_match
            && self
                .voted_by
                .up_voters
                .is_disjoint(&self.voted_by.down_voters)
    }
}

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteType {
    /// Up vote.
    #[serde(rename = "upvote")]
    Up,

    /// Down vote.
    #[serde(rename = "downvote")]
    Down,
}

impl FromStr for VoteType {
    type Err = ForumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upvote" | "up" => Ok(Self::Up),
            "downvote" | "down" => Ok(Self::Down),
            other => Err(ForumError::InvalidArgument(format!(
                "unknown vote type: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("upvote"),
            Self::Down => f.write_str("downvote"),
        }
    }
}

/// Result of [`Post::apply_vote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// First vote by this voter.
    Cast(VoteType),

    /// Voter moved from the opposite direction.
    Switched(VoteType),

    /// Voter already holds this direction; nothing changed.
    AlreadyVoted(VoteType),
}

impl VoteOutcome {
    /// Whether the post was modified.
    #[must_use]
    pub const fn changed(&self) -> bool {
        !matches!(self, Self::AlreadyVoted(_))
    }

    /// User-facing message for the outcome.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Cast(VoteType::Up) => "Up voted",
            Self::Cast(VoteType::Down) => "Down voted",
            Self::Switched(VoteType::Up) => "Vote switched to up",
            Self::Switched(VoteType::Down) => "Vote switched to down",
            Self::AlreadyVoted(VoteType::Up) => "Already up voted",
            Self::AlreadyVoted(VoteType::Down) => "Already down voted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    fn post() -> Post {
        Post::new(email("author@x.com"), "Author", "Title", "Body", "rust")
    }

    #[test]
    fn upvote_then_repeat_then_switch() {
        let mut post = post();
        let voter = email("c@x.com");

        assert_eq!(
            post.apply_vote(&voter, VoteType::Up),
            VoteOutcome::Cast(VoteType::Up)
        );
        assert_eq!((post.up_vote, post.down_vote), (1, 0));

        let again = post.apply_vote(&voter, VoteType::Up);
        assert_eq!(again, VoteOutcome::AlreadyVoted(VoteType::Up));
        assert!(!again.changed());
        assert_eq!((post.up_vote, post.down_vote), (1, 0));

        assert_eq!(
            post.apply_vote(&voter, VoteType::Down),
            VoteOutcome::Switched(VoteType::Down)
        );
        assert_eq!((post.up_vote, post.down_vote), (0, 1));
        assert!(post.voted_by.down_voters.contains(&voter));
        assert!(!post.voted_by.up_voters.contains(&voter));
        assert!(post.votes_consistent());
    }

    #[test]
    fn switching_from_down_moves_voter() {
        let mut post = post();
        let voter = email("v@x.com");
        post.apply_vote(&voter, VoteType::Down);
        post.apply_vote(&email("w@x.com"), VoteType::Down);

        post.apply_vote(&voter, VoteType::Up);

        assert_eq!(post.up_vote, 1);
        assert_eq!(post.down_vote, 1);
        assert_eq!(post.vote_of(&voter), Some(VoteType::Up));
        assert!(post.votes_consistent());
    }

    #[test]
    fn arbitrary_sequences_keep_invariant() {
        let mut post = post();
        let voters: Vec<Email> = (0..5).map(|i| email(&format!("u{i}@x.com"))).collect();
        let pattern = [0usize, 1, 1, 0, 2, 3, 3, 4, 0, 2, 1, 4, 4, 3];

        for (step, idx) in pattern.iter().enumerate() {
            let vote = if step % 3 == 0 { VoteType::Down } else { VoteType::Up };
            post.apply_vote(&voters[*idx], vote);
            assert!(post.votes_consistent(), "broken after step {step}");
        }
    }

    #[test]
    fn popularity_is_signed() {
        let mut post = post();
        post.apply_vote(&email("a@x.com"), VoteType::Down);
        post.apply_vote(&email("b@x.com"), VoteType::Down);
        post.apply_vote(&email("c@x.com"), VoteType::Up);
        assert_eq!(post.popularity(), -1);
    }

    #[test]
    fn vote_type_parsing() {
        assert_eq!("upvote".parse::<VoteType>().unwrap(), VoteType::Up);
        assert_eq!("down".parse::<VoteType>().unwrap(), VoteType::Down);
        assert!(matches!(
            "sideways".parse::<VoteType>(),
            Err(ForumError::InvalidArgument(_))
        ));
    }
}
