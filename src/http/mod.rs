//! HTTP client module
//!
//! Provides the HTTP client used to talk to the upstream API.
//!
//! # Features
//!
//! - **Rate Limiting**: Optional token bucket pacing using governor
//! - **Status Classification**: 2xx passes through, 429 becomes
//!   `Error::RateLimited`, everything else becomes `Error::HttpStatus`
//! - **Authentication**: Integration with auth module
//!
//! Retrying is deliberately not done here. Backoff on rate limits is owned
//! by the fetch engine so that the retry budget spans a whole session.

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
