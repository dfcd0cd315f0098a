//! # RedisConnection CRD
//!
//! Describes how to reach a Redis cache. The reconciler verifies
//! connectivity with a PING and records the result in the conditions.

use serde::{Deserialize, Serialize};

use crate::crd::conditions::{impl_status_conditions, Condition};

#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "RedisConnection",
    group = "stack.datastack.dev",
    version = "v1alpha1",
    namespaced,
    status = "RedisConnectionStatus",
    shortname = "redisconn",
    printcolumn = r#"{"name":"Available", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Available\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RedisConnectionSpec {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedisConnectionStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl_status_conditions!(RedisConnection, RedisConnectionStatus);
