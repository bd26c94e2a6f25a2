//! Cursor tracking
//!
//! Projects the continuation token out of a page. The token itself is
//! opaque; the tracker only decides whether another page exists.

use super::types::PageResponse;

/// Follows the continuation token between pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorTracker;

impl CursorTracker {
    /// Create a new cursor tracker
    pub fn new() -> Self {
        Self
    }

    /// Cursor for the page after `response`, or `None` when exhausted
    ///
    /// An empty token is treated the same as a missing one.
    pub fn next(&self, response: &PageResponse) -> Option<String> {
        response
            .next_cursor
            .as_deref()
            .filter(|cursor| !cursor.is_empty())
            .map(str::to_string)
    }
}
