//! Read-only database users
//!
//! The SQL template hands its functions a MySQL user that can only SELECT,
//! created with the admin credentials the user supplies.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection, Executor};
use tracing::{debug, info};

/// Where to connect and as whom
#[derive(Clone)]
pub struct MySqlTarget {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub admin_user: String,
    pub admin_password: String,
}

impl std::fmt::Debug for MySqlTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("admin_user", &self.admin_user)
            .field("admin_password", &"********")
            .finish()
    }
}

#[async_trait]
pub trait DatabaseAdmin: Send + Sync {
    /// Replace `user` with a fresh account that may only read `target.database`
    async fn create_read_only_user(
        &self,
        target: &MySqlTarget,
        user: &str,
        password: &str,
    ) -> Result<()>;

    /// Run `statements` in order on a connection with no default database
    async fn execute(&self, target: &MySqlTarget, statements: &[String]) -> Result<()>;
}

/// Hosts the read-only user is created for
const USER_HOSTS: [&str; 2] = ["%", "localhost"];

/// Accept only plain MySQL identifiers, which are interpolated unquoted
pub fn validate_identifier(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        bail!("{} must not be empty", kind);
    }
    if value.len() > 64 {
        bail!("{} '{}' is longer than 64 characters", kind, value);
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        bail!(
            "{} '{}' may only contain letters, digits, '_' and '$'",
            kind,
            value
        );
    }
    Ok(())
}

/// Quote a string literal for MySQL.
///
/// Quotes are doubled, which reads the same with or without
/// `NO_BACKSLASH_ESCAPES`. Backslashes do not, so callers reject them.
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Statements that (re)create `user` with SELECT on `database` only
pub fn read_only_user_statements(database: &str, user: &str, password: &str) -> Result<Vec<String>> {
    validate_identifier("Database name", database)?;
    validate_identifier("User name", user)?;
    if user.len() > 32 {
        bail!("User name '{}' is longer than 32 characters", user);
    }

    if password.contains('\\') {
        bail!("Database passwords may not contain a backslash");
    }

    let password = quote_literal(password);
    let mut statements = Vec::new();
    for host in USER_HOSTS {
        statements.push(format!("DROP USER IF EXISTS '{}'@'{}'", user, host));
    }
    for host in USER_HOSTS {
        statements.push(format!(
            "CREATE USER '{}'@'{}' IDENTIFIED BY {}",
            user, host, password
        ));
    }
    for host in USER_HOSTS {
        statements.push(format!(
            "GRANT SELECT ON {}.* TO '{}'@'{}'",
            database, user, host
        ));
    }
    statements.push("FLUSH PRIVILEGES".to_string());
    Ok(statements)
}

/// MySQL over sqlx
#[derive(Debug, Default)]
pub struct MySqlAdmin;

impl MySqlAdmin {
    pub fn new() -> Self {
        Self
    }
}

/// First word of a statement, for logs that must not carry its values
fn statement_kind(statement: &str) -> &str {
    statement.split_whitespace().next().unwrap_or("")
}

impl MySqlAdmin {
    async fn connect(&self, target: &MySqlTarget, database: Option<&str>) -> Result<MySqlConnection> {
        let mut options = MySqlConnectOptions::new()
            .host(&target.host)
            .port(target.port)
            .username(&target.admin_user)
            .password(&target.admin_password);
        if let Some(database) = database {
            options = options.database(database);
        }
        options.connect().await.with_context(|| {
            format!(
                "Failed to connect to MySQL at {}:{} as {}",
                target.host, target.port, target.admin_user
            )
        })
    }
}

#[async_trait]
impl DatabaseAdmin for MySqlAdmin {
    async fn create_read_only_user(
        &self,
        target: &MySqlTarget,
        user: &str,
        password: &str,
    ) -> Result<()> {
        let statements = read_only_user_statements(&target.database, user, password)?;
        let mut conn = self.connect(target, Some(&target.database)).await?;

        for statement in &statements {
            // statements carry the password
            debug!(kind = statement_kind(statement), "Executing");
            conn.execute(statement.as_str())
                .await
                .with_context(|| format!("Failed to set up database user {}", user))?;
        }

        conn.close()
            .await
            .context("Failed to close MySQL connection")?;

        info!(user = user, database = %target.database, "Read-only database user created");
        Ok(())
    }

    async fn execute(&self, target: &MySqlTarget, statements: &[String]) -> Result<()> {
        let mut conn = self.connect(target, None).await?;

        for (index, statement) in statements.iter().enumerate() {
            debug!(index = index, kind = statement_kind(statement), "Executing");
            conn.execute(statement.as_str()).await.with_context(|| {
                format!(
                    "Statement {} of {} failed ({})",
                    index + 1,
                    statements.len(),
                    statement_kind(statement)
                )
            })?;
        }

        conn.close()
            .await
            .context("Failed to close MySQL connection")?;
        Ok(())
    }
}
