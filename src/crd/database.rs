//! # Database CRD
//!
//! A Database declares a logical database on a referenced connection. The
//! reconciler creates a dedicated role plus the database itself, grants the
//! role full access, and publishes the generated credentials as a Secret.
//!
//! # Example
//!
//! ```yaml
//! apiVersion: stack.datastack.dev/v1alpha1
//! kind: Database
//! metadata:
//!   name: orders
//!   namespace: default
//! spec:
//!   name: orders
//!   reference: postgres-main
//! ```

use serde::{Deserialize, Serialize};

use crate::crd::conditions::{impl_status_conditions, Condition};

#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Database",
    group = "stack.datastack.dev",
    version = "v1alpha1",
    namespaced,
    status = "DatabaseStatus",
    shortname = "db",
    printcolumn = r#"{"name":"Available", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Available\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSpec {
    /// Logical database name to create on the referenced server
    pub name: String,
    /// Name of a DatabaseConnection in the same namespace
    pub reference: String,
    /// Credential bookkeeping, attached by the reconciler once the
    /// principal exists (or provided up front to adopt an existing secret)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<DatabaseCredential>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseCredential {
    /// Name of the Secret holding `username`/`password`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Database {
    /// Name of the generated credential secret for this database.
    pub fn secret_name(&self) -> String {
        format!("{}-secret", self.metadata.name.as_deref().unwrap_or_default())
    }
}

impl_status_conditions!(Database, DatabaseStatus);
