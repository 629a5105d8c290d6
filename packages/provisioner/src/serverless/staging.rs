//! Function project staging
//!
//! The user's functions project is copied into a temporary directory and a
//! `.env` with per-function access tokens and template secrets is written
//! next to it, so the source tree never holds credentials.

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};
use walkdir::WalkDir;

/// What gets written into the staged project's `.env`
#[derive(Debug, Clone, Default)]
pub struct FunctionEnv {
    /// Functions that get a generated `<NAME>_TOKEN`
    pub functions: Vec<String>,
    /// Template secrets, written after the tokens in this order
    pub secrets: Vec<(String, String)>,
}

impl FunctionEnv {
    pub fn new<S: AsRef<str>>(functions: &[S]) -> Self {
        Self {
            functions: functions.iter().map(|f| f.as_ref().to_string()).collect(),
            secrets: Vec::new(),
        }
    }

    pub fn secret(mut self, key: &str, value: impl Into<String>) -> Self {
        self.secrets.push((key.to_string(), value.into()));
        self
    }

    /// Render the `.env` contents, generating a fresh token per function
    pub fn render(&self) -> String {
        let mut out = String::new();
        for function in &self.functions {
            let _ = writeln!(out, "{}={}", token_variable(function), generate_token());
        }
        for (key, value) in &self.secrets {
            let _ = writeln!(out, "{}={}", key, value);
        }
        out
    }
}

/// Name of the access-token variable for a function (`get_logs` -> `GET_LOGS_TOKEN`)
pub fn token_variable(function: &str) -> String {
    let normalized: String = function
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{}_TOKEN", normalized)
}

/// 16 random bytes, URL-safe base64 without padding
pub fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// A copy of the functions project living in a temporary directory.
///
/// The directory is removed when this value is dropped.
pub struct StagedProject {
    _root: TempDir,
    project_dir: PathBuf,
}

impl StagedProject {
    /// Copy `source` into a new temporary directory and write its `.env`
    pub fn prepare(source: &Path, env: &FunctionEnv) -> Result<Self> {
        if !source.is_dir() {
            bail!(
                "Functions project {} does not exist or is not a directory",
                source.display()
            );
        }

        let root = tempfile::Builder::new()
            .prefix("gradient-functions-")
            .tempdir()
            .context("Failed to create staging directory")?;
        let project_dir = root.path().join("tools");

        copy_tree(source, &project_dir)?;

        let env_path = project_dir.join(".env");
        std::fs::write(&env_path, env.render())
            .with_context(|| format!("Failed to write {}", env_path.display()))?;

        info!(
            source = %source.display(),
            staged = %project_dir.display(),
            functions = env.functions.len(),
            "Functions project staged"
        );

        Ok(Self {
            _root: root,
            project_dir,
        })
    }

    /// Directory to hand to `doctl serverless deploy`
    pub fn path(&self) -> &Path {
        &self.project_dir
    }
}

/// Recursively copy a directory tree
fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.with_context(|| format!("Failed to read {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .context("Walked outside the functions project")?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else {
            std::fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            debug!(file = %relative.display(), "Copied");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_variable_names() {
        assert_eq!(token_variable("get_logs"), "GET_LOGS_TOKEN");
        assert_eq!(token_variable("search"), "SEARCH_TOKEN");
        assert_eq!(token_variable("execute-query"), "EXECUTE_QUERY_TOKEN");
    }

    #[test]
    fn test_generated_tokens_are_url_safe() {
        let token = generate_token();
        assert_eq!(token.len(), 22);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_render_orders_tokens_then_secrets() {
        let env = FunctionEnv::new(&["get_schema", "execute_query"])
            .secret("DB_HOST", "db.example")
            .secret("DB_PORT", "25060");
        let rendered = env.render();
        let keys: Vec<&str> = rendered
            .lines()
            .map(|l| l.split('=').next().unwrap())
            .collect();
        assert_eq!(
            keys,
            vec!["GET_SCHEMA_TOKEN", "EXECUTE_QUERY_TOKEN", "DB_HOST", "DB_PORT"]
        );
        assert!(rendered.contains("DB_HOST=db.example\n"));
    }

    #[test]
    fn test_prepare_copies_tree_and_writes_env() {
        let source = tempfile::tempdir().unwrap();
        let pkg = source.path().join("packages").join("demo-tools").join("ping");
        std::fs::create_dir_all(&pkg).unwrap();
        std::fs::write(pkg.join("__main__.py"), "def main(args): return {}").unwrap();
        std::fs::write(source.path().join("project.yml"), "packages: []").unwrap();

        let env = FunctionEnv::new(&["ping"]).secret("AGENT_TOKEN", "secret");
        let staged = StagedProject::prepare(source.path(), &env).unwrap();

        assert!(staged.path().join("project.yml").exists());
        assert!(staged
            .path()
            .join("packages/demo-tools/ping/__main__.py")
            .exists());

        let dotenv = std::fs::read_to_string(staged.path().join(".env")).unwrap();
        assert!(dotenv.starts_with("PING_TOKEN="));
        assert!(dotenv.ends_with("AGENT_TOKEN=secret\n"));

        // the source tree stays clean
        assert!(!source.path().join(".env").exists());
    }

    #[test]
    fn test_prepare_rejects_missing_project() {
        let dir = tempfile::tempdir().unwrap();
        let result = StagedProject::prepare(&dir.path().join("tools"), &FunctionEnv::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_staging_dir_removed_on_drop() {
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("project.yml"), "").unwrap();
        let staged = StagedProject::prepare(source.path(), &FunctionEnv::default()).unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }
}
