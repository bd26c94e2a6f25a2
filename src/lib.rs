//! # fub-export
//!
//! Bulk exporter for contact records served by a cursor-paginated,
//! rate-limited CRM API.
//!
//! ## Features
//!
//! - **Cursor Pagination**: Follows opaque continuation tokens until the API runs dry
//! - **Record Cap**: Never collects more than the requested number of records
//! - **Backoff**: Exponential backoff on HTTP 429 with a bounded retry budget
//! - **Partial Results**: Every way a run ends returns what was collected
//! - **Export**: CSV, JSON and Parquet files, or formatted contacts on stdout
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fub_export::{auth::Credential, config::ApiConfig};
//! use fub_export::connector::HttpPageSource;
//! use fub_export::engine::FetchController;
//!
//! #[tokio::main]
//! async fn main() -> fub_export::Result<()> {
//!     let source = HttpPageSource::new(&ApiConfig::default(), Credential::new("api-key"))?;
//!     let outcome = FetchController::new(source).fetch(250, 100).await?;
//!
//!     println!("{} records ({})", outcome.len(), outcome.termination);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        FetchController                          │
//! │  fetch(target_count, page_size) → FetchOutcome{records, why}    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Paginate    │  Backoff  │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Basic    │ GET       │ Cursor token  │ 429 only  │ CSV / JSON  │
//! │          │ Rate Limit│ Record path   │ Doubling  │ Parquet     │
//! │          │ Timeout   │               │ Budget    │ Publisher   │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication
pub mod auth;

/// HTTP client with rate limiting
pub mod http;

/// Page decoding and cursor tracking
pub mod pagination;

/// Fetch loop and backoff policy
pub mod engine;

/// Page source trait and HTTP implementation
pub mod connector;

/// Configuration
pub mod config;

/// CSV/JSON/Parquet export
pub mod output;

/// Contact flattening
pub mod format;

/// Contact publishing
pub mod publish;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::ExportConfig;
pub use connector::{HttpPageSource, PageSource, RequestOutcome};
pub use engine::{FetchController, FetchOutcome, Termination};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
