//! # S3Connection CRD
//!
//! Describes how to reach an S3-compatible object store with administrative
//! credentials. Buckets reference a connection by name.

use serde::{Deserialize, Serialize};

use crate::crd::conditions::{impl_status_conditions, Condition};

#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "S3Connection",
    group = "stack.datastack.dev",
    version = "v1alpha1",
    namespaced,
    status = "S3ConnectionStatus",
    shortname = "s3conn",
    printcolumn = r#"{"name":"Available", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Available\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct S3ConnectionSpec {
    pub credential: S3Credential,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct S3Credential {
    /// Name of a Secret holding `accessKey`/`secretKey` and optionally
    /// `endpoint`/`region`/`ssl`; takes precedence over the inline fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_secret: Option<String>,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    /// host:port of the object store
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub ssl: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct S3ConnectionStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl_status_conditions!(S3Connection, S3ConnectionStatus);
