//! In-memory [`HttpApi`] for unit tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use nailgun_core::{Error, HttpApi, HttpError, Method, Request, Response, Result};

/// Answers canned JSON per `(method, path)` and records every request.
/// Unknown routes answer 404.
#[derive(Debug, Default)]
pub struct FakeApi {
    routes: HashMap<(Method, String), Value>,
    requests: Vec<Request>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, method: Method, path: &str, body: Value) -> Self {
        self.routes.insert((method, path.to_string()), body);
        self
    }

    /// `"METHOD /path"` for every request in order.
    pub fn paths(&self) -> Vec<String> {
        self.requests
            .iter()
            .map(|r| format!("{} {}", r.method(), r.path()))
            .collect()
    }

    /// Body of the most recent request with the given method.
    pub fn last_body(&self, method: Method) -> Option<Value> {
        self.requests
            .iter()
            .rev()
            .find(|r| r.method() == method)
            .and_then(|r| r.body().cloned())
    }

    /// Body of the most recent request to `path` with the given method.
    pub fn body_of(&self, method: Method, path: &str) -> Option<Value> {
        self.requests
            .iter()
            .rev()
            .find(|r| r.method() == method && r.path() == path)
            .and_then(|r| r.body().cloned())
    }
}

#[async_trait]
impl HttpApi for FakeApi {
    async fn send(&mut self, request: Request) -> Result<Response> {
        let key = (request.method(), request.path().to_string());
        self.requests.push(request);
        match self.routes.get(&key) {
            Some(body) => Ok(Response::new(
                200,
                [("content-type".to_string(), "application/json".to_string())],
                body.to_string(),
            )),
            None => Err(Error::Http(HttpError::new(404, ""))),
        }
    }
}
