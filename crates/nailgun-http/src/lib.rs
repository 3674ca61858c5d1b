//! nailgun-http - Keystone-authenticated HTTP client for the Nailgun API.

mod client;
mod config;
mod keystone;
mod transport;

pub use client::{AuthState, HttpClient};
pub use config::ClientConfig;
pub use keystone::{AUTH_TOKEN_HEADER, KeystoneVersion, SUBJECT_TOKEN_HEADER};
