//! Environment files and secret display
//!
//! The env file has to be loaded before clap parses arguments, otherwise the
//! `env = "..."` fallbacks on flags would not see its values.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Env file read when `--env-file` is not given
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Variable naming an env file, below `--env-file` in precedence
pub const ENV_FILE_VAR: &str = "GRADIENT_ENV_FILE";

/// Outcome of looking for an env file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFileStatus {
    Loaded(PathBuf),
    /// The default `.env` was absent, which is fine
    Absent,
    /// A file named explicitly on the command line was absent
    Missing(PathBuf),
}

/// Find the value of `--env-file` in raw arguments.
///
/// Accepts both `--env-file PATH` and `--env-file=PATH`. Returns `None` when
/// the flag is absent.
pub fn env_file_from_args<I, T>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    while let Some(arg) = args.next() {
        let arg = arg.to_string_lossy().into_owned();
        if arg == "--" {
            break;
        }
        if arg == "--env-file" {
            return args.next().map(PathBuf::from);
        }
        if let Some(value) = arg.strip_prefix("--env-file=") {
            return Some(PathBuf::from(value));
        }
    }
    None
}

/// The env file asked for: `--env-file` in `args`, then `from_var`
/// (the value of `GRADIENT_ENV_FILE`).
pub fn requested_env_file<I, T>(args: I, from_var: Option<OsString>) -> Option<PathBuf>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    env_file_from_args(args).or_else(|| {
        from_var
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    })
}

/// Load an env file into the process environment.
///
/// Variables that are already set win over the file. With no explicit path
/// the default `.env` in the working directory is tried and its absence is
/// not reported.
pub fn load_env_file(explicit: Option<&Path>) -> Result<EnvFileStatus> {
    load_env_file_in(Path::new("."), explicit)
}

/// `load_env_file`, looking for the default file in `dir`
pub fn load_env_file_in(dir: &Path, explicit: Option<&Path>) -> Result<EnvFileStatus> {
    let (path, is_explicit) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (dir.join(DEFAULT_ENV_FILE), false),
    };

    if !path.exists() {
        if is_explicit {
            warn!(path = %path.display(), "Environment file not found");
            return Ok(EnvFileStatus::Missing(path));
        }
        return Ok(EnvFileStatus::Absent);
    }

    dotenvy::from_path(&path)
        .with_context(|| format!("Failed to load environment file {}", path.display()))?;
    debug!(path = %path.display(), "Loaded environment file");
    Ok(EnvFileStatus::Loaded(path))
}

/// Show only the last four characters of a token
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

/// Hide a password completely
pub fn mask_secret(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

/// Display form of an optional secret
pub fn describe_optional_secret(secret: Option<&str>) -> &'static str {
    match secret {
        Some(_) => "set",
        None => "not set",
    }
}
