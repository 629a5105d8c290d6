//! Persistent settings
//!
//! User defaults stored in ~/.gradient-templates/config.toml. Values here sit
//! below CLI flags and environment variables in precedence.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public DigitalOcean API endpoint
pub const DEFAULT_API_URL: &str = "https://api.digitalocean.com";

/// Region used when nothing else is configured
pub const DEFAULT_REGION: &str = "tor1";

/// doctl context used when nothing else is configured
pub const DEFAULT_CONTEXT: &str = "default";

/// Settings persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// API base URL override
    pub api_url: Option<String>,

    /// API token saved by `login`
    pub token: Option<String>,

    /// doctl auth context
    pub context: Option<String>,

    /// Project that new resources are created in
    pub default_project_id: Option<String>,

    /// Region for new resources
    pub default_region: Option<String>,

    /// Fixed waits between provisioning steps
    #[serde(default)]
    pub pacing: Pacing,
}

/// Waits and polling limits used by the provisioning steps.
///
/// The platform accepts some requests before the resource behind them is
/// usable, so a few steps sleep briefly before the next call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pacing {
    /// Wait after creating a functions namespace
    #[serde(default = "default_namespace_settle")]
    pub namespace_settle_secs: u64,

    /// Wait after creating a bucket, before assigning it to a project
    #[serde(default = "default_bucket_settle")]
    pub bucket_settle_secs: u64,

    /// Wait after creating an agent, before updating it
    #[serde(default = "default_agent_settle")]
    pub agent_settle_secs: u64,

    /// Wait before triggering an indexing job on an existing database
    #[serde(default = "default_pre_index")]
    pub pre_index_secs: u64,

    /// Wait before attaching tools to a freshly updated agent
    #[serde(default = "default_tool_attach")]
    pub tool_attach_secs: u64,

    /// Interval between knowledge base database status checks
    #[serde(default = "default_database_poll")]
    pub database_poll_secs: u64,

    /// Give up waiting for a knowledge base database after this long
    #[serde(default = "default_database_max_wait")]
    pub database_max_wait_secs: u64,

    /// Interval between agent deployment checks
    #[serde(default = "default_agent_poll")]
    pub agent_poll_secs: u64,

    /// Give up waiting for agent deployment after this long
    #[serde(default = "default_agent_max_wait")]
    pub agent_max_wait_secs: u64,
}

// Default value functions
fn default_namespace_settle() -> u64 {
    10
}

fn default_bucket_settle() -> u64 {
    5
}

fn default_agent_settle() -> u64 {
    10
}

fn default_pre_index() -> u64 {
    5
}

fn default_tool_attach() -> u64 {
    5
}

fn default_database_poll() -> u64 {
    60
}

fn default_database_max_wait() -> u64 {
    600
}

fn default_agent_poll() -> u64 {
    10
}

fn default_agent_max_wait() -> u64 {
    600
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            namespace_settle_secs: default_namespace_settle(),
            bucket_settle_secs: default_bucket_settle(),
            agent_settle_secs: default_agent_settle(),
            pre_index_secs: default_pre_index(),
            tool_attach_secs: default_tool_attach(),
            database_poll_secs: default_database_poll(),
            database_max_wait_secs: default_database_max_wait(),
            agent_poll_secs: default_agent_poll(),
            agent_max_wait_secs: default_agent_max_wait(),
        }
    }
}

impl Pacing {
    /// No waits at all. Polls still run, back to back.
    pub fn immediate() -> Self {
        Self {
            namespace_settle_secs: 0,
            bucket_settle_secs: 0,
            agent_settle_secs: 0,
            pre_index_secs: 0,
            tool_attach_secs: 0,
            database_poll_secs: 0,
            database_max_wait_secs: 0,
            agent_poll_secs: 0,
            agent_max_wait_secs: 0,
        }
    }

    pub fn namespace_settle(&self) -> Duration {
        Duration::from_secs(self.namespace_settle_secs)
    }

    pub fn bucket_settle(&self) -> Duration {
        Duration::from_secs(self.bucket_settle_secs)
    }

    pub fn agent_settle(&self) -> Duration {
        Duration::from_secs(self.agent_settle_secs)
    }

    pub fn pre_index(&self) -> Duration {
        Duration::from_secs(self.pre_index_secs)
    }

    pub fn tool_attach(&self) -> Duration {
        Duration::from_secs(self.tool_attach_secs)
    }

    pub fn database_poll(&self) -> Duration {
        Duration::from_secs(self.database_poll_secs)
    }

    pub fn database_max_wait(&self) -> Duration {
        Duration::from_secs(self.database_max_wait_secs)
    }

    pub fn agent_poll(&self) -> Duration {
        Duration::from_secs(self.agent_poll_secs)
    }

    pub fn agent_max_wait(&self) -> Duration {
        Duration::from_secs(self.agent_max_wait_secs)
    }
}

/// Sleep for `duration`, skipping the timer entirely for zero
pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

impl Settings {
    /// Get the config file path (~/.gradient-templates/config.toml)
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".gradient-templates").join("config.toml"))
    }

    /// Load settings from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(Self::path()?)
    }

    /// Load settings from a TOML file, or defaults if it does not exist
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(settings)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(Self::path()?)
    }

    /// Save settings to a TOML file, creating parent directories
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config at {}", path.display()))?;
        Ok(())
    }

    /// Get API base URL
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// Get the doctl context
    pub fn context(&self) -> &str {
        self.context.as_deref().unwrap_or(DEFAULT_CONTEXT)
    }

    /// Get the default region
    pub fn region(&self) -> &str {
        self.default_region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    /// Check if a non-empty token has been saved
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}
