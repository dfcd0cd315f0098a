//! # Bucket Policy Documents
//!
//! Per-bucket access policies scoping `s3:*` to the bucket's ARN for a
//! single principal. Generation is deterministic: the same
//! (accessKey, bucket) pair always yields byte-identical JSON, which
//! matters for external compatibility checks against the registered
//! canned policy.

use serde::Serialize;

const POLICY_VERSION: &str = "2012-10-17";
const ACTION_ALL: &str = "s3:*";

#[derive(Debug, Serialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    version: &'static str,
    #[serde(rename = "Statement")]
    statement: Vec<Statement>,
}

#[derive(Debug, Serialize)]
struct Statement {
    #[serde(rename = "Sid")]
    sid: &'static str,
    #[serde(rename = "Effect")]
    effect: &'static str,
    #[serde(rename = "Principal")]
    principal: Principal,
    #[serde(rename = "Resource")]
    resource: String,
    #[serde(rename = "Action")]
    action: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct Principal {
    #[serde(rename = "AWS")]
    aws: Vec<String>,
}

fn statement(sid: &'static str, access_key: &str, bucket: &str) -> Statement {
    Statement {
        sid,
        effect: "Allow",
        principal: Principal {
            aws: vec![format!("arn:aws:iam::{access_key}:root")],
        },
        resource: format!("arn:aws:s3:::{bucket}/*"),
        action: vec![ACTION_ALL],
    }
}

/// Serialized policy granting the principal full access to the bucket.
pub fn bucket_policy(access_key: &str, bucket: &str) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&PolicyDocument {
        version: POLICY_VERSION,
        statement: vec![
            statement("ObjectLevel", access_key, bucket),
            statement("BucketLevel", access_key, bucket),
        ],
    })
}
