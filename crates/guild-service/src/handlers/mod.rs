//! API handlers.

pub mod announcements;
pub mod comments;
pub mod friends;
pub mod groups;
pub mod health;
pub mod payments;
pub mod posts;
pub mod reports;
pub mod session;
pub mod tags;
pub mod users;

use serde::{Deserialize, Serialize};

use guild_core::{Page, Window};

/// Window parameters shared by list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    /// First N results; wins over `page`/`size`.
    pub limit: Option<usize>,
    /// Zero-based page number.
    pub page: Option<usize>,
    /// Results per page.
    pub size: Option<usize>,
}

impl WindowParams {
    /// Resolve into a [`Window`].
    #[must_use]
    pub fn window(&self) -> Window {
        Window::from_params(self.limit, self.page, self.size)
    }
}

/// A windowed list response.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    /// Items inside the window.
    pub items: Vec<T>,
    /// Size of the filtered set the window was cut from.
    pub total: usize,
    /// Whether more items exist past this window.
    pub has_more: bool,
}

impl<T> ListResponse<T> {
    /// Wrap a store page.
    #[must_use]
    pub fn from_page(page: Page<T>, window: Window) -> Self {
        let has_more = page.has_more(window);
        Self {
            items: page.items,
            total: page.total,
            has_more,
        }
    }
}

/// A bare count.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    /// The count.
    pub count: u64,
    /// Whether the count is a fast estimate rather than exact.
    pub estimated: bool,
}

/// Acknowledgement for writes that return nothing else.
#[derive(Debug, Serialize)]
pub struct Ack {
    /// Always `true`.
    pub success: bool,
}

impl Ack {
    /// A successful acknowledgement.
    #[must_use]
    pub const fn ok() -> Self {
        Self { success: true }
    }
}
