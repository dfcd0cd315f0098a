//! # DatabaseConnection CRD
//!
//! Describes how to reach a relational database server with administrative
//! credentials. Databases reference a connection by name; a connection may be
//! marked as the default for its driver, with at most one default per
//! (namespace, driver) pair.

use serde::{Deserialize, Serialize};

use crate::crd::conditions::{impl_status_conditions, Condition};

/// Supported relational drivers. Anything else is rejected by schema
/// validation before it ever reaches the reconciler.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum DbDriver {
    #[default]
    Postgres,
    Mysql,
}

impl DbDriver {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbDriver::Postgres => "postgres",
            DbDriver::Mysql => "mysql",
        }
    }
}

impl std::fmt::Display for DbDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "DatabaseConnection",
    group = "stack.datastack.dev",
    version = "v1alpha1",
    namespaced,
    status = "DatabaseConnectionStatus",
    shortname = "dbconn",
    printcolumn = r#"{"name":"Driver", "type":"string", "jsonPath":".spec.provider.driver"}, {"name":"Available", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Available\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConnectionSpec {
    pub provider: DatabaseProvider,
    /// Marks this connection as the default for its driver in the namespace
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseProvider {
    #[serde(default)]
    pub driver: DbDriver,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub ssl: bool,
    /// Admin credential material, inline or via an existing secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<ConnectionCredential>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCredential {
    /// Name of a Secret holding `username`/`password`; takes precedence
    /// over the inline fields when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConnectionStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl_status_conditions!(DatabaseConnection, DatabaseConnectionStatus);
