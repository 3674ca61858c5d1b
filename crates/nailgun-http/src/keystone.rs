//! Keystone token exchange.
//!
//! Both identity API generations are supported. The version is picked from
//! the keystone URL: a path ending in `/v3` selects v3, anything else v2.0.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use nailgun_core::{ApiUrl, AuthError, AuthToken, Credentials, Error, Response};

use crate::transport::{read_response, transport_error};

/// Header carrying the token on orchestrator requests.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Header carrying the issued token in a keystone v3 response.
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Domain used to scope v3 users and projects.
const DEFAULT_DOMAIN: &str = "default";

/// Keystone identity API generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystoneVersion {
    V2,
    V3,
}

impl KeystoneVersion {
    /// Infer the identity API generation from the keystone base URL.
    pub fn detect(url: &ApiUrl) -> Self {
        if url.path().ends_with("/v3") {
            KeystoneVersion::V3
        } else {
            KeystoneVersion::V2
        }
    }

    /// Path of the token endpoint relative to the keystone base URL.
    pub fn tokens_path(&self) -> &'static str {
        match self {
            KeystoneVersion::V2 => "/tokens",
            KeystoneVersion::V3 => "/auth/tokens",
        }
    }
}

// ============================================================================
// v2.0 wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct V2TokenRequest<'a> {
    auth: V2Auth<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct V2Auth<'a> {
    tenant_name: &'a str,
    password_credentials: V2PasswordCredentials<'a>,
}

#[derive(Debug, Serialize)]
struct V2PasswordCredentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct V2TokenResponse {
    access: V2Access,
}

#[derive(Debug, Deserialize)]
struct V2Access {
    token: V2Token,
}

#[derive(Debug, Deserialize)]
struct V2Token {
    id: String,
}

// ============================================================================
// v3 wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct V3TokenRequest<'a> {
    auth: V3Auth<'a>,
}

#[derive(Debug, Serialize)]
struct V3Auth<'a> {
    identity: V3Identity<'a>,
    scope: V3Scope<'a>,
}

#[derive(Debug, Serialize)]
struct V3Identity<'a> {
    methods: [&'static str; 1],
    password: V3Password<'a>,
}

#[derive(Debug, Serialize)]
struct V3Password<'a> {
    user: V3User<'a>,
}

#[derive(Debug, Serialize)]
struct V3User<'a> {
    name: &'a str,
    domain: V3Domain,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct V3Scope<'a> {
    project: V3Project<'a>,
}

#[derive(Debug, Serialize)]
struct V3Project<'a> {
    name: &'a str,
    domain: V3Domain,
}

#[derive(Debug, Serialize)]
struct V3Domain {
    id: &'static str,
}

/// Build the JSON body of the token request.
fn token_request_body(
    version: KeystoneVersion,
    credentials: &Credentials,
) -> Result<serde_json::Value, Error> {
    let body = match version {
        KeystoneVersion::V2 => serde_json::to_value(V2TokenRequest {
            auth: V2Auth {
                tenant_name: credentials.tenant_name(),
                password_credentials: V2PasswordCredentials {
                    username: credentials.username(),
                    password: credentials.password(),
                },
            },
        })?,
        KeystoneVersion::V3 => serde_json::to_value(V3TokenRequest {
            auth: V3Auth {
                identity: V3Identity {
                    methods: ["password"],
                    password: V3Password {
                        user: V3User {
                            name: credentials.username(),
                            domain: V3Domain { id: DEFAULT_DOMAIN },
                            password: credentials.password(),
                        },
                    },
                },
                scope: V3Scope {
                    project: V3Project {
                        name: credentials.tenant_name(),
                        domain: V3Domain { id: DEFAULT_DOMAIN },
                    },
                },
            },
        })?,
    };
    Ok(body)
}

/// Pull the token out of a successful keystone response.
fn token_from_response(version: KeystoneVersion, response: &Response) -> Result<String, AuthError> {
    match version {
        KeystoneVersion::V2 => response
            .json::<V2TokenResponse>()
            .map(|body| body.access.token.id)
            .map_err(|e| AuthError::MalformedTokenResponse {
                reason: format!("missing access.token.id: {}", e),
            }),
        KeystoneVersion::V3 => response
            .header(SUBJECT_TOKEN_HEADER)
            .map(str::to_string)
            .ok_or_else(|| AuthError::MalformedTokenResponse {
                reason: format!("missing {} header", SUBJECT_TOKEN_HEADER),
            }),
    }
}

/// The keystone endpoint tokens are obtained from.
#[derive(Debug, Clone)]
pub(crate) struct Keystone {
    url: ApiUrl,
    version: KeystoneVersion,
}

impl Keystone {
    pub(crate) fn new(url: ApiUrl) -> Self {
        let version = KeystoneVersion::detect(&url);
        Self { url, version }
    }

    pub(crate) fn url(&self) -> &ApiUrl {
        &self.url
    }

    /// Trade credentials for a token. A non-2xx answer is never retried.
    #[instrument(skip(self, http, credentials), fields(keystone = %self.url, user = %credentials.username()))]
    pub(crate) async fn authenticate(
        &self,
        http: &reqwest::Client,
        credentials: &Credentials,
        timeout: Option<Duration>,
    ) -> Result<AuthToken, Error> {
        let url = self.url.endpoint(self.version.tokens_path());
        debug!(%url, version = ?self.version, "Requesting keystone token");

        let body = token_request_body(self.version, credentials)?;
        let response = http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;
        let response = read_response(response, timeout).await?;

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(AuthError::Rejected {
                status,
                message: response.message(),
            }
            .into());
        }

        let token = token_from_response(self.version, &response)?;
        debug!("Keystone token issued");
        Ok(AuthToken::new(token, self.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn creds() -> Credentials {
        Credentials::new("admin", "secret", "services")
    }

    #[test]
    fn detects_version_from_path() {
        let v2 = ApiUrl::new("http://10.20.0.2:5000/v2.0").unwrap();
        let v3 = ApiUrl::new("http://10.20.0.2:5000/v3/").unwrap();
        let bare = ApiUrl::new("http://10.20.0.2:5000").unwrap();
        assert_eq!(KeystoneVersion::detect(&v2), KeystoneVersion::V2);
        assert_eq!(KeystoneVersion::detect(&v3), KeystoneVersion::V3);
        assert_eq!(KeystoneVersion::detect(&bare), KeystoneVersion::V2);
    }

    #[test]
    fn v2_request_body() {
        let body = token_request_body(KeystoneVersion::V2, &creds()).unwrap();
        assert_eq!(
            body,
            json!({
                "auth": {
                    "tenantName": "services",
                    "passwordCredentials": {"username": "admin", "password": "secret"}
                }
            })
        );
    }

    #[test]
    fn v3_request_body() {
        let body = token_request_body(KeystoneVersion::V3, &creds()).unwrap();
        assert_eq!(body["auth"]["identity"]["methods"], json!(["password"]));
        assert_eq!(
            body["auth"]["identity"]["password"]["user"],
            json!({"name": "admin", "domain": {"id": "default"}, "password": "secret"})
        );
        assert_eq!(
            body["auth"]["scope"]["project"],
            json!({"name": "services", "domain": {"id": "default"}})
        );
    }

    #[test]
    fn v2_token_from_body() {
        let response = Response::new(
            200,
            Vec::new(),
            r#"{"access": {"token": {"id": "tok-1", "expires": "2030-01-01T00:00:00Z"}}}"#,
        );
        assert_eq!(
            token_from_response(KeystoneVersion::V2, &response).unwrap(),
            "tok-1"
        );
    }

    #[test]
    fn v2_token_missing_is_malformed() {
        let response = Response::new(200, Vec::new(), r#"{"access": {}}"#);
        let err = token_from_response(KeystoneVersion::V2, &response).unwrap_err();
        assert!(matches!(err, AuthError::MalformedTokenResponse { .. }));
    }

    #[test]
    fn v3_token_from_header() {
        let response = Response::new(
            201,
            [("X-Subject-Token".to_string(), "tok-3".to_string())],
            "{}",
        );
        assert_eq!(
            token_from_response(KeystoneVersion::V3, &response).unwrap(),
            "tok-3"
        );

        let response = Response::new(201, Vec::new(), "{}");
        assert!(token_from_response(KeystoneVersion::V3, &response).is_err());
    }
}
