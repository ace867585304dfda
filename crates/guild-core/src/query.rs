//! Pagination and query façade shared by every list endpoint.
//!
//! A list request is a filter, a sort order, and a window. The window is
//! either `limit` (first N, no offset) or `page`/`size` (offset
//! `page * size`); when both are supplied, `limit` wins.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::{Email, Post};

/// Page size used when only `page` is given.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound on any window.
pub const MAX_PAGE_SIZE: usize = 100;

/// Slice of the filtered result set to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Everything that matched.
    All,
    /// The first `n` results.
    Limit(usize),
    /// `size` results starting at `page * size`.
    Page {
        /// Zero-based page number.
        page: usize,
        /// Results per page.
        size: usize,
    },
}

impl Window {
    /// Resolve raw `limit`/`page`/`size` parameters.
    ///
    /// A zero `limit` counts as absent. Sizes are clamped to
    /// `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn from_params(limit: Option<usize>, page: Option<usize>, size: Option<usize>) -> Self {
        match (limit.filter(|l| *l > 0), page, size) {
            (Some(limit), _, _) => Self::Limit(limit.min(MAX_PAGE_SIZE)),
            (None, None, None) => Self::All,
            (None, page, size) => Self::Page {
                page: page.unwrap_or(0),
                size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            },
        }
    }

    /// Number of leading results skipped.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::All | Self::Limit(_) => 0,
            Self::Page { page, size } => page.saturating_mul(*size),
        }
    }

    /// Maximum number of results returned.
    #[must_use]
    pub fn take(&self) -> usize {
        match self {
            Self::All => usize::MAX,
            Self::Limit(n) => *n,
            Self::Page { size, .. } => *size,
        }
    }

    /// Cut `items` down to this window.
    #[must_use]
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.offset()).take(self.take()).collect()
    }
}

/// One window of a filtered result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Results inside the window.
    pub items: Vec<T>,
    /// Size of the whole filtered set the window was cut from.
    pub total: usize,
}

impl<T> Page<T> {
    /// Window a fully filtered and sorted result set.
    ///
    /// `total` counts what survived filtering (and joins), not the raw
    /// collection, so page arithmetic on the client stays consistent.
    #[must_use]
    pub fn from_filtered(items: Vec<T>, window: Window) -> Self {
        let total = items.len();
        Self {
            items: window.apply(items),
            total,
        }
    }

    /// Whether results exist beyond this window.
    #[must_use]
    pub fn has_more(&self, window: Window) -> bool {
        window.offset().saturating_add(self.items.len()) < self.total
    }
}

/// Case-insensitive substring filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFilter(String);

impl TextFilter {
    /// Build a filter; blank input means "no filter".
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Self(s.to_lowercase()))
    }

    /// Whether `haystack` contains the needle, ignoring case.
    #[must_use]
    pub fn matches(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.0)
    }
}

/// Result ordering for posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Newest first by creation time.
    #[default]
    Newest,
    /// Highest popularity score first, newest first among ties.
    Popular,
}

/// A post listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    /// Only posts by this author.
    pub author: Option<Email>,
    /// Only posts whose tag contains this text.
    pub tag: Option<TextFilter>,
    /// Ordering.
    pub sort: SortOrder,
    /// Window.
    pub window: Window,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            author: None,
            tag: None,
            sort: SortOrder::Newest,
            window: Window::All,
        }
    }
}

impl PostQuery {
    /// Whether `post` passes the filter part of the query.
    #[must_use]
    pub fn matches(&self, post: &Post) -> bool {
        self.author.as_ref().map_or(true, |a| &post.author_email == a)
            && self.tag.as_ref().map_or(true, |t| t.matches(&post.tag))
    }

    /// Order `posts` in place.
    pub fn sort(&self, posts: &mut [Post]) {
        match self.sort {
            SortOrder::Newest => posts.sort_by_key(|p| Reverse((p.created_at, p.id))),
            SortOrder::Popular => {
                posts.sort_by_key(|p| Reverse((p.popularity(), p.created_at, p.id)));
            }
        }
    }

    /// Filter, sort, and window `posts`.
    #[must_use]
    pub fn run(&self, posts: impl IntoIterator<Item = Post>) -> Page<Post> {
        let mut matched: Vec<Post> = posts.into_iter().filter(|p| self.matches(p)).collect();
        self.sort(&mut matched);
        Page::from_filtered(matched, self.window)
    }
}
