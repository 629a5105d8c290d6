//! Gradient Provisioner Library
//!
//! This crate provides the building blocks for deploying agent templates on
//! the DigitalOcean GenAI platform: the control-plane API client, the doctl
//! serverless runner, Spaces bucket provisioning, knowledge base and agent
//! setup, and the template pipelines that chain them together.

pub mod api;
pub mod config;
pub mod ledger;
pub mod platform;
pub mod provision;
pub mod serverless;
pub mod storage;
pub mod templates;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use api::client::DoClient;
pub use api::control_plane::ControlPlane;
pub use api::error::ApiError;
pub use config::settings::{Pacing, Settings};
pub use ledger::{ResourceKind, ResourceLedger};
pub use provision::database::{DatabaseAdmin, MySqlAdmin};
pub use serverless::doctl::{Doctl, ServerlessCli};
pub use storage::spaces::{ObjectStore, SpacesStore};
pub use platform::{Credentials, Platform};
pub use templates::{DeploymentReport, Template};
