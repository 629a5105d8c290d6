//! doctl runner
//!
//! Serverless functions are deployed with the `doctl` CLI, which has to be
//! authenticated and connected to the target namespace first.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, error, info};

/// The serverless CLI operations a deployment needs
#[async_trait]
pub trait ServerlessCli: Send + Sync {
    /// Authenticate the CLI with an API token under a named context
    async fn auth_init(&self, token: &str, context: &str) -> Result<()>;

    /// Point the CLI at a functions namespace
    async fn connect(&self, namespace: &str, token: &str) -> Result<()>;

    /// Deploy a functions project directory into the connected namespace
    async fn deploy(&self, project_dir: &Path) -> Result<()>;
}

/// Output of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// `doctl` invoked as a child process
pub struct Doctl {
    program: String,
}

impl Doctl {
    /// Use `doctl` from PATH
    pub fn new() -> Self {
        Self {
            program: "doctl".to_string(),
        }
    }

    /// Use a specific doctl binary
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    /// Arguments for `doctl auth init`
    pub fn auth_init_args(token: &str, context: &str) -> Vec<String> {
        vec![
            "auth".to_string(),
            "init".to_string(),
            "-t".to_string(),
            token.to_string(),
            "--context".to_string(),
            context.to_string(),
            "--interactive".to_string(),
            "false".to_string(),
        ]
    }

    /// Arguments for `doctl serverless connect`
    pub fn connect_args(namespace: &str, token: &str) -> Vec<String> {
        vec![
            "serverless".to_string(),
            "connect".to_string(),
            namespace.to_string(),
            "-t".to_string(),
            token.to_string(),
        ]
    }

    /// Arguments for `doctl serverless deploy`
    pub fn deploy_args(project_dir: &Path) -> Vec<String> {
        vec![
            "serverless".to_string(),
            "deploy".to_string(),
            project_dir.to_string_lossy().into_owned(),
        ]
    }

    /// Run doctl and fail on a non-zero exit status.
    ///
    /// `action` names the step in error messages. Arguments are never logged
    /// since they carry the API token.
    async fn run(&self, action: &str, args: &[String]) -> Result<CommandOutput> {
        debug!(program = %self.program, action = action, "Running doctl");

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to run {} (is doctl installed?)", self.program))?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.status.success() {
            error!(action = action, stderr = %result.stderr.trim(), "doctl failed");
            bail!("doctl {} failed: {}", action, result.stderr.trim());
        }

        Ok(result)
    }
}

impl Default for Doctl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServerlessCli for Doctl {
    async fn auth_init(&self, token: &str, context: &str) -> Result<()> {
        self.run("login", &Self::auth_init_args(token, context))
            .await?;
        info!(context = context, "doctl login successful");
        Ok(())
    }

    async fn connect(&self, namespace: &str, token: &str) -> Result<()> {
        let output = self
            .run("serverless connect", &Self::connect_args(namespace, token))
            .await?;
        info!(output = %output.stdout.trim(), "doctl serverless connection successful");
        Ok(())
    }

    async fn deploy(&self, project_dir: &Path) -> Result<()> {
        let output = self
            .run("serverless deploy", &Self::deploy_args(project_dir))
            .await?;
        info!(output = %output.stdout.trim(), "doctl deploy successful");
        Ok(())
    }
}
