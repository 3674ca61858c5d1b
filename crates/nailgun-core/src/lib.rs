//! nailgun-core - Core types and traits for the Fuel Nailgun API.
//!
//! The orchestrator is reached through the [`HttpApi`] verb trait. Requests
//! are described by [`Request`], answered by raw [`Response`] values, and
//! every failure is one of the [`Error`] variants.

pub mod credentials;
pub mod error;
pub mod request;
pub mod response;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::Credentials;
pub use error::{AuthError, Error, HttpError, InvalidInputError, NetworkError};
pub use request::{Method, Request};
pub use response::Response;
pub use tokens::AuthToken;
pub use traits::HttpApi;
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
