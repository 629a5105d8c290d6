//! Platform handles
//!
//! Everything a template talks to, bundled so pipelines can be run against
//! the real platform or against fakes in tests.

use anyhow::Result;
use std::sync::Arc;

use crate::api::client::DoClient;
use crate::api::control_plane::ControlPlane;
use crate::config::settings::Pacing;
use crate::ledger::ResourceLedger;
use crate::provision::database::{DatabaseAdmin, MySqlAdmin};
use crate::serverless::doctl::{Doctl, ServerlessCli};
use crate::storage::spaces::{ObjectStore, SpacesStore};

/// API token plus the doctl context it is registered under
#[derive(Clone)]
pub struct Credentials {
    pub token: String,
    pub context: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &crate::config::env::mask_token(&self.token))
            .field("context", &self.context)
            .finish()
    }
}

#[derive(Clone)]
pub struct Platform {
    pub api: Arc<dyn ControlPlane>,
    pub serverless: Arc<dyn ServerlessCli>,
    pub storage: Arc<dyn ObjectStore>,
    pub database: Arc<dyn DatabaseAdmin>,
    pub credentials: Credentials,
    pub pacing: Pacing,
    pub ledger: ResourceLedger,
}

impl Platform {
    /// Handles for the real platform, with the API at `api_url`
    pub fn connect(credentials: Credentials, api_url: &str, pacing: Pacing) -> Result<Self> {
        let api = DoClient::new(&credentials.token, api_url)?;
        Ok(Self {
            api: Arc::new(api),
            serverless: Arc::new(Doctl::new()),
            storage: Arc::new(SpacesStore::new()),
            database: Arc::new(MySqlAdmin::new()),
            credentials,
            pacing,
            ledger: ResourceLedger::new(),
        })
    }
}
