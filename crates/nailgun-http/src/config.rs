//! Client construction parameters.

use std::time::Duration;

use nailgun_core::{ApiUrl, Credentials};

/// Everything [`HttpClient`](crate::HttpClient) needs at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the orchestrator API.
    pub base_url: ApiUrl,
    /// Base URL of the keystone identity API (e.g. `http://host:5000/v2.0`).
    pub keystone_url: ApiUrl,
    /// Credentials traded for a token.
    pub credentials: Credentials,
    /// Connect and read timeout applied to every request, if any.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a config with no timeout.
    pub fn new(base_url: ApiUrl, keystone_url: ApiUrl, credentials: Credentials) -> Self {
        Self {
            base_url,
            keystone_url,
            credentials,
            timeout: None,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
