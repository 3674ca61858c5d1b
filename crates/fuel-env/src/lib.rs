//! Fuel environment deployment.
//!
//! [`NailgunClient`] wraps the Nailgun REST API over any
//! [`HttpApi`](nailgun_core::HttpApi). [`deploy::run`] drives it through the
//! cluster, network and node setup described by a [`Settings`] file.

pub mod deploy;
pub mod nailgun;
pub mod settings;

#[cfg(test)]
mod test_support;

pub use deploy::Deployment;
pub use nailgun::{NailgunClient, parse_json};
pub use settings::Settings;
