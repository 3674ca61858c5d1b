//! Core traits for orchestrator clients.

mod api;

pub use api::HttpApi;
