//! Pagination module
//!
//! Cursor-based pagination: each page carries an opaque continuation token
//! that is sent back on the next request. A missing or empty token means
//! the listing is exhausted.

mod cursor;
mod types;

pub use cursor::CursorTracker;
pub use types::{extract_path, PageExtractor, PageResponse};
