//! Keystone auth token type.

use std::fmt;

use crate::types::ApiUrl;

/// An auth token attached to every orchestrator request.
///
/// Tokens are opaque and their lifetime is not known up front; a token is
/// considered expired when the orchestrator answers 401 or 403.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone)]
pub struct AuthToken {
    value: String,
    issuer: ApiUrl,
}

impl AuthToken {
    /// Create a new token issued by the given keystone endpoint.
    pub fn new(value: impl Into<String>, issuer: ApiUrl) -> Self {
        Self {
            value: value.into(),
            issuer,
        }
    }

    /// Returns the token value for use in the auth header.
    ///
    /// # Security
    ///
    /// Use only when constructing HTTP request headers.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns the keystone endpoint that issued this token.
    pub fn issuer(&self) -> &ApiUrl {
        &self.issuer
    }
}

// Hide token value in Debug output
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .finish()
    }
}
