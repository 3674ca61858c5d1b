//! Orchestrator and keystone URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated base URL of an HTTP API (the orchestrator or keystone).
///
/// Only absolute `http` and `https` URLs with a host are accepted. A trailing
/// slash is dropped so that [`ApiUrl::endpoint`] never produces `//`.
///
/// # Example
///
/// ```
/// use nailgun_core::ApiUrl;
///
/// let nailgun = ApiUrl::new("http://10.20.0.2:8000").unwrap();
/// assert_eq!(nailgun.endpoint("/api/nodes/"), "http://10.20.0.2:8000/api/nodes/");
///
/// let keystone = ApiUrl::new("http://10.20.0.2:5000/v2.0/").unwrap();
/// assert_eq!(keystone.endpoint("tokens"), "http://10.20.0.2:5000/v2.0/tokens");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiUrl(String);

impl ApiUrl {
    /// Create a new API URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::Url {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        // The URL crate always adds a trailing slash to root paths
        let normalized = url.as_str().trim_end_matches('/').to_string();

        Ok(Self(normalized))
    }

    /// Returns the full URL of a path relative to this base.
    ///
    /// The path may carry a query string; it is appended verbatim.
    pub fn endpoint(&self, path: &str) -> String {
        if path.is_empty() {
            return self.0.clone();
        }
        if path.starts_with('/') {
            format!("{}{}", self.0, path)
        } else {
            format!("{}/{}", self.0, path)
        }
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path component of the base URL, without a trailing slash.
    pub fn path(&self) -> &str {
        let after_scheme = self.0.split_once("://").map_or("", |(_, rest)| rest);
        match after_scheme.find('/') {
            Some(idx) => &after_scheme[idx..],
            None => "",
        }
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::Url {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(InvalidInputError::Url {
                value: original.to_string(),
                reason: format!("unsupported scheme '{}'", scheme),
            }
            .into());
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(InvalidInputError::Url {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(InvalidInputError::Url {
                value: original.to_string(),
                reason: "must not carry a query or fragment".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApiUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ApiUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ApiUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ApiUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for ApiUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_http_url() {
        let url = ApiUrl::new("http://10.20.0.2:8000").unwrap();
        assert_eq!(url.as_str(), "http://10.20.0.2:8000");
        assert_eq!(url.path(), "");
    }

    #[test]
    fn normalizes_trailing_slash() {
        let url = ApiUrl::new("http://10.20.0.2:5000/v2.0/").unwrap();
        assert_eq!(url.as_str(), "http://10.20.0.2:5000/v2.0");
        assert_eq!(url.path(), "/v2.0");
        assert_eq!(url.endpoint("/tokens"), "http://10.20.0.2:5000/v2.0/tokens");
    }

    #[test]
    fn endpoint_keeps_query_string() {
        let url = ApiUrl::new("https://fuel.example.com/").unwrap();
        assert_eq!(
            url.endpoint("/api/nodes/?cluster_id=3"),
            "https://fuel.example.com/api/nodes/?cluster_id=3"
        );
        assert_eq!(url.endpoint(""), "https://fuel.example.com");
    }

    #[test]
    fn invalid_scheme() {
        assert!(ApiUrl::new("ftp://10.20.0.2").is_err());
        assert!(ApiUrl::new("file:///tmp/nailgun").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(ApiUrl::new("/api/nodes").is_err());
    }

    #[test]
    fn rejects_query_in_base() {
        assert!(ApiUrl::new("http://10.20.0.2:8000/?debug=1").is_err());
    }

    #[test]
    fn deserializes_with_validation() {
        let url: ApiUrl = serde_json::from_str(r#""http://localhost:8000/""#).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000");
        assert!(serde_json::from_str::<ApiUrl>(r#""not a url""#).is_err());
    }
}
