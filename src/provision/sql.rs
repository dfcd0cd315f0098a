//! # SQL Provisioning Driver
//!
//! Creates and tears down database principals and databases over an admin
//! connection. Dialect differences (existence checks, quoting of user
//! specifiers) are isolated behind [`DatabaseProvisioner`]; selection
//! happens once at connect time from the DSN's driver tag.
//!
//! Every step is independently idempotent: user creation checks the role
//! catalog first and resets the password on an existing principal, database
//! creation checks the schema catalog, grants re-run, drops use IF EXISTS.
//! A retry after a partial failure therefore resumes cleanly instead of
//! tripping over its own earlier progress.

use async_trait::async_trait;
use regex::Regex;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlSslMode};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::Connection;
use std::sync::LazyLock;

use crate::crd::DbDriver;
use crate::error::{Error, Result};
use crate::provision::dsn::Dsn;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z0-9_]+$").expect("static pattern"));

/// Reject anything that cannot be safely interpolated into DDL.
fn validate_identifier(name: &str, what: &str) -> Result<()> {
    if name.is_empty() || !IDENTIFIER.is_match(name) {
        return Err(Error::Validation(format!("invalid {what}: {name:?}")));
    }
    Ok(())
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Capability set of a relational backend, admin-side.
#[async_trait]
pub trait DatabaseProvisioner: Send {
    /// Create the principal, or reset its password if it already exists.
    async fn init_user(&mut self, username: &str, password: &str) -> Result<()>;
    /// Create the database if absent and grant the owner full access.
    async fn init_database(&mut self, owner: &str, database: &str) -> Result<()>;
    async fn drop_database(&mut self, database: &str) -> Result<()>;
    async fn drop_user(&mut self, username: &str) -> Result<()>;
    async fn ping(&mut self) -> Result<()>;
}

/// Open a connection for the DSN's driver and wrap it in the matching
/// dialect implementation.
pub async fn connect(dsn: &Dsn) -> Result<Box<dyn DatabaseProvisioner>> {
    match dsn.driver {
        DbDriver::Postgres => Ok(Box::new(PostgresProvisioner::connect(dsn).await?)),
        DbDriver::Mysql => Ok(Box::new(MySqlProvisioner::connect(dsn).await?)),
    }
}

pub struct PostgresProvisioner {
    conn: PgConnection,
}

impl PostgresProvisioner {
    pub async fn connect(dsn: &Dsn) -> Result<Self> {
        let mut options = PgConnectOptions::new()
            .host(&dsn.host)
            .port(dsn.port)
            .ssl_mode(if dsn.ssl {
                PgSslMode::Require
            } else {
                PgSslMode::Disable
            });
        if !dsn.username.is_empty() {
            options = options.username(&dsn.username);
        }
        if !dsn.password.is_empty() {
            options = options.password(&dsn.password);
        }
        if !dsn.database.is_empty() {
            options = options.database(&dsn.database);
        }
        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| Error::Connectivity(format!("postgres connect: {e}")))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl DatabaseProvisioner for PostgresProvisioner {
    async fn init_user(&mut self, username: &str, password: &str) -> Result<()> {
        validate_identifier(username, "username")?;
        let existing: i64 = sqlx::query_scalar("SELECT count(*) FROM pg_roles WHERE rolname = $1")
            .bind(username)
            .fetch_one(&mut self.conn)
            .await?;
        let stmt = if existing == 0 {
            statements::pg_create_user(username, password)
        } else {
            statements::pg_alter_password(username, password)
        };
        sqlx::query(&stmt).execute(&mut self.conn).await?;
        Ok(())
    }

    async fn init_database(&mut self, owner: &str, database: &str) -> Result<()> {
        validate_identifier(owner, "username")?;
        validate_identifier(database, "database name")?;
        let existing: i64 =
            sqlx::query_scalar("SELECT count(*) FROM pg_database WHERE datname = $1")
                .bind(database)
                .fetch_one(&mut self.conn)
                .await?;
        if existing == 0 {
            sqlx::query(&statements::pg_create_database(database))
                .execute(&mut self.conn)
                .await?;
        }
        sqlx::query(&statements::pg_grant(database, owner))
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn drop_database(&mut self, database: &str) -> Result<()> {
        validate_identifier(database, "database name")?;
        sqlx::query(&statements::pg_drop_database(database))
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn drop_user(&mut self, username: &str) -> Result<()> {
        validate_identifier(username, "username")?;
        sqlx::query(&statements::pg_drop_user(username))
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn ping(&mut self) -> Result<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| Error::Connectivity(format!("postgres ping: {e}")))
    }
}

pub struct MySqlProvisioner {
    conn: MySqlConnection,
}

impl MySqlProvisioner {
    pub async fn connect(dsn: &Dsn) -> Result<Self> {
        let mut options = MySqlConnectOptions::new()
            .host(&dsn.host)
            .port(dsn.port)
            .ssl_mode(if dsn.ssl {
                MySqlSslMode::Required
            } else {
                MySqlSslMode::Disabled
            });
        if !dsn.username.is_empty() {
            options = options.username(&dsn.username);
        }
        if !dsn.password.is_empty() {
            options = options.password(&dsn.password);
        }
        // admin sessions land in the built-in catalog when no database is
        // requested, mirroring the DSN rendering
        let database = if dsn.database.is_empty() {
            "mysql"
        } else {
            dsn.database.as_str()
        };
        options = options.database(database);
        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| Error::Connectivity(format!("mysql connect: {e}")))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl DatabaseProvisioner for MySqlProvisioner {
    async fn init_user(&mut self, username: &str, password: &str) -> Result<()> {
        validate_identifier(username, "username")?;
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mysql.user WHERE User = ?")
            .bind(username)
            .fetch_one(&mut self.conn)
            .await?;
        let stmt = if existing == 0 {
            statements::mysql_create_user(username, password)
        } else {
            statements::mysql_alter_password(username, password)
        };
        sqlx::query(&stmt).execute(&mut self.conn).await?;
        Ok(())
    }

    async fn init_database(&mut self, owner: &str, database: &str) -> Result<()> {
        validate_identifier(owner, "username")?;
        validate_identifier(database, "database name")?;
        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.SCHEMATA WHERE SCHEMA_NAME = ?",
        )
        .bind(database)
        .fetch_one(&mut self.conn)
        .await?;
        if existing == 0 {
            sqlx::query(&statements::mysql_create_database(database))
                .execute(&mut self.conn)
                .await?;
        }
        sqlx::query(&statements::mysql_grant(database, owner))
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn drop_database(&mut self, database: &str) -> Result<()> {
        validate_identifier(database, "database name")?;
        sqlx::query(&statements::mysql_drop_database(database))
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn drop_user(&mut self, username: &str) -> Result<()> {
        validate_identifier(username, "username")?;
        sqlx::query(&statements::mysql_drop_user(username))
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn ping(&mut self) -> Result<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| Error::Connectivity(format!("mysql ping: {e}")))
    }
}

/// DDL builders, split out so dialect output stays testable without a
/// live server. Identifiers are validated by the callers; literals are
/// escaped here.
mod statements {
    use super::escape_literal;

    pub fn pg_create_user(username: &str, password: &str) -> String {
        format!(
            "CREATE USER {username} WITH PASSWORD '{}'",
            escape_literal(password)
        )
    }

    pub fn pg_alter_password(username: &str, password: &str) -> String {
        format!(
            "ALTER USER {username} WITH PASSWORD '{}'",
            escape_literal(password)
        )
    }

    pub fn pg_create_database(database: &str) -> String {
        format!("CREATE DATABASE {database}")
    }

    pub fn pg_grant(database: &str, username: &str) -> String {
        format!("GRANT ALL PRIVILEGES ON DATABASE {database} TO {username}")
    }

    pub fn pg_drop_database(database: &str) -> String {
        format!("DROP DATABASE IF EXISTS {database}")
    }

    pub fn pg_drop_user(username: &str) -> String {
        format!("DROP USER IF EXISTS {username}")
    }

    pub fn mysql_create_user(username: &str, password: &str) -> String {
        format!(
            "CREATE USER '{username}'@'%' IDENTIFIED BY '{}'",
            escape_literal(password)
        )
    }

    pub fn mysql_alter_password(username: &str, password: &str) -> String {
        format!(
            "ALTER USER '{username}'@'%' IDENTIFIED BY '{}'",
            escape_literal(password)
        )
    }

    pub fn mysql_create_database(database: &str) -> String {
        format!("CREATE DATABASE {database}")
    }

    pub fn mysql_grant(database: &str, username: &str) -> String {
        format!("GRANT ALL PRIVILEGES ON {database}.* TO '{username}'@'%'")
    }

    pub fn mysql_drop_database(database: &str) -> String {
        format!("DROP DATABASE IF EXISTS {database}")
    }

    pub fn mysql_drop_user(username: &str) -> String {
        format!("DROP USER IF EXISTS '{username}'@'%'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_validation() {
        assert!(validate_identifier("orders_db1", "database name").is_ok());
        assert!(validate_identifier("", "database name").is_err());
        assert!(validate_identifier("orders;DROP", "database name").is_err());
        assert!(validate_identifier("orders db", "database name").is_err());
    }

    #[test]
    fn postgres_statements() {
        assert_eq!(
            statements::pg_create_user("app1", "pw"),
            "CREATE USER app1 WITH PASSWORD 'pw'"
        );
        assert_eq!(
            statements::pg_grant("orders", "app1"),
            "GRANT ALL PRIVILEGES ON DATABASE orders TO app1"
        );
        assert_eq!(
            statements::pg_drop_database("orders"),
            "DROP DATABASE IF EXISTS orders"
        );
    }

    #[test]
    fn mysql_statements_quote_the_user_specifier() {
        assert_eq!(
            statements::mysql_create_user("app1", "pw"),
            "CREATE USER 'app1'@'%' IDENTIFIED BY 'pw'"
        );
        assert_eq!(
            statements::mysql_grant("orders", "app1"),
            "GRANT ALL PRIVILEGES ON orders.* TO 'app1'@'%'"
        );
        assert_eq!(
            statements::mysql_drop_user("app1"),
            "DROP USER IF EXISTS 'app1'@'%'"
        );
    }

    #[test]
    fn literals_are_escaped() {
        assert_eq!(
            statements::pg_create_user("app1", "p'w"),
            "CREATE USER app1 WITH PASSWORD 'p''w'"
        );
    }
}
