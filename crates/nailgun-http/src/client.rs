//! Authenticated orchestrator HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::{debug, info, instrument, trace, warn};

use nailgun_core::error::is_auth_failure;
use nailgun_core::{
    ApiUrl, AuthError, AuthToken, Credentials, Error, HttpApi, InvalidInputError, Method, Request,
    Response, Result,
};

use crate::config::ClientConfig;
use crate::keystone::{AUTH_TOKEN_HEADER, Keystone};
use crate::transport::{read_response, transport_error};

/// Whether the client currently holds a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

/// HTTP client for the orchestrator API.
///
/// A token is obtained from keystone on first use and attached to every
/// request. When the orchestrator answers 401 or 403 the token is dropped,
/// a fresh one is obtained and the request is sent once more. Transport
/// failures are never retried.
///
/// The held token is mutated through `&mut self`; share one client across
/// tasks only behind your own synchronization.
pub struct HttpClient {
    http: reqwest::Client,
    base: ApiUrl,
    keystone: Keystone,
    credentials: Credentials,
    timeout: Option<Duration>,
    token: Option<AuthToken>,
}

impl HttpClient {
    /// Create a new client. No network traffic happens until the first call.
    pub fn new(config: ClientConfig) -> Result<Self> {
        // 3xx answers are returned as-is, never followed with the token attached
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("fuel-env/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout).connect_timeout(timeout);
        }
        let http = builder.build().map_err(|e| InvalidInputError::Other {
            message: format!("failed to build HTTP client: {}", e),
        })?;

        info!(url = %config.base_url, keystone = %config.keystone_url, "Initialized Nailgun client");

        Ok(Self {
            http,
            base: config.base_url,
            keystone: Keystone::new(config.keystone_url),
            credentials: config.credentials,
            timeout: config.timeout,
            token: None,
        })
    }

    /// Returns the orchestrator base URL.
    pub fn base_url(&self) -> &ApiUrl {
        &self.base
    }

    /// Returns the keystone URL tokens are obtained from.
    pub fn keystone_url(&self) -> &ApiUrl {
        self.keystone.url()
    }

    pub fn state(&self) -> AuthState {
        if self.token.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }

    /// Obtain a token now, replacing any held one.
    pub async fn authenticate(&mut self) -> Result<()> {
        self.token = None;
        let token = self
            .keystone
            .authenticate(&self.http, &self.credentials, self.timeout)
            .await?;
        self.token = Some(token);
        Ok(())
    }

    /// Returns the held token, acquiring one first if needed.
    async fn current_token(&mut self) -> Result<AuthToken> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        self.authenticate().await?;
        match &self.token {
            Some(token) => Ok(token.clone()),
            None => Err(AuthError::MalformedTokenResponse {
                reason: "no token after authentication".to_string(),
            }
            .into()),
        }
    }

    /// Send one attempt of a request with the given token.
    async fn dispatch(&self, request: &Request, token: &AuthToken) -> Result<Response> {
        let url = self.base.endpoint(request.path());
        trace!(%url, "Dispatching request");

        let token_value = token_header(token)?;

        let mut builder = self
            .http
            .request(to_reqwest_method(request.method()), &url)
            .header(AUTH_TOKEN_HEADER, token_value);

        for (name, value) in request.headers() {
            let (name, value) = header_pair(name, value)?;
            builder = builder.header(name, value);
        }

        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;
        read_response(response, self.timeout).await
    }

    /// Acquire a token if needed and send one attempt.
    async fn attempt(&mut self, request: &Request) -> Result<Response> {
        let token = self.current_token().await?;
        let result = self.dispatch(request, &token).await;
        if let Err(Error::Auth(AuthError::MalformedTokenResponse { .. })) = &result {
            // An unusable token must not be reused by the next call
            self.token = None;
        }
        result
    }
}

#[async_trait]
impl HttpApi for HttpClient {
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    async fn send(&mut self, request: Request) -> Result<Response> {
        let mut response = self.attempt(&request).await?;

        if is_auth_failure(response.status()) {
            warn!(status = response.status(), "Token rejected, re-authenticating");
            self.token = None;
            response = self.attempt(&request).await?;

            if is_auth_failure(response.status()) {
                self.token = None;
                return Err(AuthError::RetryRejected {
                    status: response.status(),
                    message: response.message(),
                }
                .into());
            }
        }

        debug!(status = response.status(), "Response received");

        if response.is_success() {
            Ok(response)
        } else {
            Err(Error::Http(response.into_http_error()))
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base", &self.base)
            .field("keystone", &self.keystone.url())
            .field("credentials", &self.credentials)
            .field("state", &self.state())
            .finish()
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Put => reqwest::Method::PUT,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn token_header(token: &AuthToken) -> Result<HeaderValue> {
    HeaderValue::from_str(token.as_str()).map_err(|e| {
        AuthError::MalformedTokenResponse {
            reason: format!("token is not a valid header value: {}", e),
        }
        .into()
    })
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        InvalidInputError::Header {
            name: name.to_string(),
            reason: e.to_string(),
        }
    })?;
    let header_value = HeaderValue::from_str(value).map_err(|e| InvalidInputError::Header {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new(
            ApiUrl::new("http://10.20.0.2:8000").unwrap(),
            ApiUrl::new("http://10.20.0.2:5000/v2.0").unwrap(),
            Credentials::new("admin", "secret", "admin"),
        )
    }

    #[test]
    fn client_starts_unauthenticated() {
        let client = HttpClient::new(config()).unwrap();
        assert_eq!(client.state(), AuthState::Unauthenticated);
        assert_eq!(client.base_url().as_str(), "http://10.20.0.2:8000");
        assert_eq!(client.keystone_url().as_str(), "http://10.20.0.2:5000/v2.0");
    }

    #[test]
    fn debug_hides_password() {
        let client = HttpClient::new(config().with_timeout(Duration::from_secs(5))).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("Unauthenticated"));
    }

    #[test]
    fn rejects_invalid_header_names() {
        assert!(header_pair("X-Trace", "1").is_ok());
        let err = header_pair("bad header", "1").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput(InvalidInputError::Header { .. })
        ));
    }
}
