//! Conversion of reqwest failures into orchestrator errors.

use std::time::Duration;

use nailgun_core::{Error, InvalidInputError, NetworkError, Response};

/// Map a reqwest error onto the error taxonomy.
pub(crate) fn transport_error(err: reqwest::Error, timeout: Option<Duration>) -> Error {
    if err.is_builder() {
        InvalidInputError::Other {
            message: err.to_string(),
        }
        .into()
    } else if err.is_timeout() {
        NetworkError::Timeout {
            duration_ms: timeout.map_or(0, |t| t.as_millis() as u64),
        }
        .into()
    } else if err.is_connect() {
        NetworkError::Connection {
            message: err.to_string(),
        }
        .into()
    } else {
        NetworkError::Transport {
            message: err.to_string(),
        }
        .into()
    }
}

/// Read status, headers and body into a [`Response`].
pub(crate) async fn read_response(
    response: reqwest::Response,
    timeout: Option<Duration>,
) -> Result<Response, Error> {
    let status = response.status().as_u16();
    let headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(e, timeout))?;

    Ok(Response::new(status, headers, body.to_vec()))
}
