//! Auth configuration types

use serde::Deserialize;
use std::fmt;

/// An opaque API credential
///
/// The value never appears in `Debug` output and the type has no
/// `Serialize` impl, so it cannot leak into written configuration.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw credential value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the raw value for request signing
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Check whether a value was provided
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Credential(<empty>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// HTTP Basic authentication
    Basic {
        /// Username
        username: Credential,
        /// Password
        password: Credential,
    },
}

impl AuthConfig {
    /// Basic auth with the API key as username and an empty password
    pub fn api_key(key: Credential) -> Self {
        Self::Basic {
            username: key,
            password: Credential::default(),
        }
    }

    /// Check if any authentication is configured
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
