//! Error types for talking to the orchestrator.
//!
//! This module provides a unified error type with explicit variants for
//! authentication, HTTP status, network transport and input validation errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for orchestrator operations.
///
/// Callers decide whether to abort, log or retry; nothing in this crate
/// swallows an error.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, connection, timeout).
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Authentication errors (rejected credentials, rejected retry).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Non-success HTTP status other than an auth failure.
    #[error("{0}")]
    Http(#[from] HttpError),

    /// Input validation errors (invalid URL, invalid header).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Body could not be encoded to or decoded from JSON.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the HTTP error if this is one.
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Error::Http(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true if this is an authentication error.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    /// Returns true if this is a network transport error.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection could not be established (refused, DNS failure).
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// No response arrived before the configured timeout.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Any other transport failure, including reading the body.
    #[error("transport failure: {message}")]
    Transport { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Keystone rejected the credentials.
    #[error("credentials rejected (HTTP {status}){}", fmt_message(.message))]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    /// The request still failed authentication after re-authenticating.
    #[error("request rejected after re-authentication (HTTP {status}){}", fmt_message(.message))]
    RetryRejected {
        status: u16,
        message: Option<String>,
    },

    /// Keystone accepted the credentials but returned no usable token.
    #[error("malformed token response: {reason}")]
    MalformedTokenResponse { reason: String },
}

fn fmt_message(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(": {}", message),
        None => String::new(),
    }
}

/// A non-success response from the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
    /// The `message` field of a JSON body, if present.
    pub message: Option<String>,
}

impl HttpError {
    /// Create a new HTTP error, extracting the JSON `message` field from the body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = extract_message(body.as_bytes());
        Self {
            status,
            body,
            message,
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpError {}

/// Returns true for the statuses that mean the held token is no longer accepted.
pub fn is_auth_failure(status: u16) -> bool {
    status == 401 || status == 403
}

/// Pulls the `message` field out of a JSON error body.
pub(crate) fn extract_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    // Nailgun answers {"message": ..}, keystone {"error": {"message": ..}}
    value
        .get("message")
        .or_else(|| value.pointer("/error/message"))?
        .as_str()
        .map(str::to_string)
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid orchestrator or keystone URL.
    #[error("invalid URL '{value}': {reason}")]
    Url { value: String, reason: String },

    /// Header name or value that cannot be sent.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
