//! # S3Bucket CRD
//!
//! An S3Bucket declares a bucket on a referenced object-store connection.
//! The reconciler creates the bucket, a dedicated access-key principal, and
//! a per-bucket policy bound to that principal, then publishes the key pair
//! as a Secret.

use serde::{Deserialize, Serialize};

use crate::crd::conditions::{impl_status_conditions, Condition};

#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "S3Bucket",
    group = "stack.datastack.dev",
    version = "v1alpha1",
    namespaced,
    status = "S3BucketStatus",
    shortname = "bucket",
    printcolumn = r#"{"name":"Bucket", "type":"string", "jsonPath":".spec.name"}, {"name":"Available", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Available\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct S3BucketSpec {
    /// Name of an S3Connection in the same namespace
    pub reference: String,
    /// Bucket name to create on the object store
    pub name: String,
    /// Credential bookkeeping, attached by the reconciler once the
    /// principal exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<S3BucketCredential>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct S3BucketCredential {
    /// Name of the Secret holding `accessKey`/`secretKey`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_secret: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct S3BucketStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl S3Bucket {
    /// Name of the generated credential secret for this bucket.
    pub fn secret_name(&self) -> String {
        format!("{}-secret", self.metadata.name.as_deref().unwrap_or_default())
    }
}

impl_status_conditions!(S3Bucket, S3BucketStatus);
