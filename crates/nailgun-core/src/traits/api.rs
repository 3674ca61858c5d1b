//! Verb-level HTTP API trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::{Request, Response, Result};

/// An HTTP API reachable through the four orchestrator verbs.
///
/// Implementations resolve paths against their base URL and handle
/// authentication. A successful call returns the raw [`Response`]; non-success
/// statuses come back as errors. Methods take `&mut self` because a call may
/// replace the held auth token.
#[async_trait]
pub trait HttpApi: Send {
    /// Send a request descriptor.
    async fn send(&mut self, request: Request) -> Result<Response>;

    /// GET a path with optional extra headers.
    async fn get(&mut self, path: &str, headers: &[(&str, &str)]) -> Result<Response> {
        self.send(with_headers(Request::get(path), headers)).await
    }

    /// PUT a path with an optional JSON body.
    async fn put(
        &mut self,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        let request = Request::put(path).with_optional_body(body);
        self.send(with_headers(request, headers)).await
    }

    /// POST a path with an optional JSON body.
    async fn post(
        &mut self,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        let request = Request::post(path).with_optional_body(body);
        self.send(with_headers(request, headers)).await
    }

    /// DELETE a path.
    async fn delete(&mut self, path: &str, headers: &[(&str, &str)]) -> Result<Response> {
        self.send(with_headers(Request::delete(path), headers)).await
    }
}

fn with_headers(request: Request, headers: &[(&str, &str)]) -> Request {
    headers
        .iter()
        .fold(request, |request, (name, value)| request.header(*name, *value))
}
