//! # DSN
//!
//! Connection descriptor for the relational drivers, with the driver-native
//! string renderings: libpq-style `key=value` pairs for Postgres and
//! `user:password@tcp(host:port)/dbname` for MySQL. Rendering and parsing
//! round-trip for every populated field; connections themselves are opened
//! from typed options built off the same fields (see `provision::sql`).

use crate::crd::DbDriver;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dsn {
    pub driver: DbDriver,
    pub host: String,
    pub port: u16,
    pub ssl: bool,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl Dsn {
    /// Render the driver-native connection string.
    pub fn to_connection_string(&self) -> String {
        match self.driver {
            DbDriver::Postgres => self.postgres_string(),
            DbDriver::Mysql => self.mysql_string(),
        }
    }

    fn postgres_string(&self) -> String {
        let mut parts = Vec::new();
        if !self.host.is_empty() {
            parts.push(format!("host={}", self.host));
        }
        if self.port != 0 {
            parts.push(format!("port={}", self.port));
        }
        if !self.username.is_empty() {
            parts.push(format!("user={}", self.username));
        }
        if !self.password.is_empty() {
            parts.push(format!("password={}", self.password));
        }
        if !self.database.is_empty() {
            parts.push(format!("dbname={}", self.database));
        }
        parts.push(format!(
            "sslmode={}",
            if self.ssl { "require" } else { "disable" }
        ));
        parts.join(" ")
    }

    fn mysql_string(&self) -> String {
        // MySQL admin sessions land in the built-in catalog when no
        // database is requested
        let database = if self.database.is_empty() {
            "mysql"
        } else {
            self.database.as_str()
        };
        format!(
            "{}:{}@tcp({}:{})/{}",
            self.username, self.password, self.host, self.port, database
        )
    }

    /// Parse a libpq-style `key=value` connection string.
    pub fn parse_postgres(input: &str) -> Result<Self> {
        let mut dsn = Dsn {
            driver: DbDriver::Postgres,
            ..Default::default()
        };
        for pair in input.split_whitespace() {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| Error::Validation(format!("malformed dsn field: {pair}")))?;
            match key {
                "host" => dsn.host = value.to_string(),
                "port" => {
                    dsn.port = value
                        .parse()
                        .map_err(|_| Error::Validation(format!("invalid port: {value}")))?;
                }
                "user" => dsn.username = value.to_string(),
                "password" => dsn.password = value.to_string(),
                "dbname" => dsn.database = value.to_string(),
                "sslmode" => dsn.ssl = value == "require",
                other => {
                    return Err(Error::Validation(format!("unknown dsn field: {other}")));
                }
            }
        }
        Ok(dsn)
    }

    /// Parse a `user:password@tcp(host:port)/dbname` connection string.
    pub fn parse_mysql(input: &str) -> Result<Self> {
        let malformed = || Error::Validation(format!("malformed mysql dsn: {input}"));
        let (userinfo, rest) = input.split_once("@tcp(").ok_or_else(malformed)?;
        let (username, password) = userinfo.split_once(':').ok_or_else(malformed)?;
        let (addr, database) = rest.split_once(")/").ok_or_else(malformed)?;
        let (host, port) = addr.rsplit_once(':').ok_or_else(malformed)?;
        Ok(Dsn {
            driver: DbDriver::Mysql,
            host: host.to_string(),
            port: port
                .parse()
                .map_err(|_| Error::Validation(format!("invalid port: {port}")))?,
            ssl: false,
            username: username.to_string(),
            password: password.to_string(),
            database: database.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_rendering_matches_libpq_format() {
        let dsn = Dsn {
            driver: DbDriver::Postgres,
            host: "db.example.com".into(),
            port: 5432,
            ssl: true,
            username: "admin".into(),
            password: "secret".into(),
            database: "orders".into(),
        };
        assert_eq!(
            dsn.to_connection_string(),
            "host=db.example.com port=5432 user=admin password=secret dbname=orders sslmode=require"
        );
    }

    #[test]
    fn postgres_rendering_omits_absent_fields() {
        let dsn = Dsn {
            driver: DbDriver::Postgres,
            host: "127.0.0.1".into(),
            port: 5432,
            username: "root".into(),
            password: "123456".into(),
            ..Default::default()
        };
        assert_eq!(
            dsn.to_connection_string(),
            "host=127.0.0.1 port=5432 user=root password=123456 sslmode=disable"
        );
    }

    #[test]
    fn mysql_rendering_defaults_to_builtin_catalog() {
        let dsn = Dsn {
            driver: DbDriver::Mysql,
            host: "127.0.0.1".into(),
            port: 3306,
            username: "root".into(),
            password: "123456".into(),
            ..Default::default()
        };
        assert_eq!(
            dsn.to_connection_string(),
            "root:123456@tcp(127.0.0.1:3306)/mysql"
        );
    }

    #[test]
    fn postgres_round_trip_preserves_fields() {
        let dsn = Dsn {
            driver: DbDriver::Postgres,
            host: "pg.internal".into(),
            port: 5433,
            ssl: false,
            username: "owner1".into(),
            password: "pw".into(),
            database: "app".into(),
        };
        let parsed = Dsn::parse_postgres(&dsn.to_connection_string()).unwrap();
        assert_eq!(parsed, dsn);
    }

    #[test]
    fn mysql_round_trip_preserves_fields() {
        let dsn = Dsn {
            driver: DbDriver::Mysql,
            host: "mysql.internal".into(),
            port: 3307,
            ssl: false,
            username: "owner1".into(),
            password: "pw".into(),
            database: "app".into(),
        };
        let parsed = Dsn::parse_mysql(&dsn.to_connection_string()).unwrap();
        assert_eq!(parsed, dsn);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(Dsn::parse_postgres("host=a port=notaport sslmode=disable").is_err());
        assert!(Dsn::parse_postgres("host=a bogus").is_err());
        assert!(Dsn::parse_mysql("not-a-dsn").is_err());
    }
}
