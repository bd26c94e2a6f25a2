//! Authentication module
//!
//! Supports: Basic (API key as username, empty password).
//!
//! The API credential is opaque to the fetch logic. It is passed in
//! explicitly as configuration and applied to each request by the
//! `Authenticator`.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, Credential};
