//! # Object Storage Provisioning Driver
//!
//! Bucket, principal, and policy management against an S3-compatible
//! store. Bucket operations use the AWS SDK pointed at the connection's
//! endpoint (path-style addressing for MinIO); user and canned-policy
//! operations go through the admin REST client.

mod admin;
pub mod policy;

pub use admin::AdminClient;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Region};

use crate::error::{Error, Result};

const DEFAULT_REGION: &str = "us-east-1";

/// Resolved admin connection material for an object store.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// host:port of the store
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub ssl: bool,
}

impl StoreConfig {
    pub fn region_or_default(&self) -> &str {
        if self.region.is_empty() {
            DEFAULT_REGION
        } else {
            &self.region
        }
    }
}

/// Capability set of an object-store backend, admin-side.
#[async_trait]
pub trait ObjectStoreProvisioner: Send + Sync {
    /// Create the bucket unless it already exists.
    async fn create_bucket(&self, bucket: &str) -> Result<()>;
    async fn create_user(&self, access_key: &str, secret_key: &str) -> Result<()>;
    /// Register the deterministic per-bucket policy under the given name.
    async fn create_user_policy(
        &self,
        policy_name: &str,
        access_key: &str,
        bucket: &str,
    ) -> Result<()>;
    async fn bind_policy(&self, access_key: &str, policy_name: &str) -> Result<()>;
    async fn remove_user(&self, access_key: &str) -> Result<()>;
    async fn remove_policy(&self, policy_name: &str) -> Result<()>;
    async fn remove_bucket(&self, bucket: &str) -> Result<()>;
}

pub struct MinioProvisioner {
    s3: aws_sdk_s3::Client,
    admin: AdminClient,
}

impl MinioProvisioner {
    /// Build both clients from the resolved connection. Construction
    /// failure aborts the reconcile pass.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let admin = AdminClient::new(config)?;
        let scheme = if config.ssl { "https" } else { "http" };
        let credentials = aws_credential_types::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "s3connection",
        );
        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region_or_default().to_string()))
            .endpoint_url(format!("{scheme}://{}", config.endpoint))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();
        Ok(Self {
            s3: aws_sdk_s3::Client::from_conf(s3_config),
            admin,
        })
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.s3.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(Error::ObjectStore(format!(
                        "head bucket {bucket}: {service_err}"
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStoreProvisioner for MinioProvisioner {
    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        if self.bucket_exists(bucket).await? {
            return Ok(());
        }
        self.s3
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| Error::ObjectStore(format!("create bucket {bucket}: {e}")))?;
        Ok(())
    }

    async fn create_user(&self, access_key: &str, secret_key: &str) -> Result<()> {
        self.admin.add_user(access_key, secret_key).await
    }

    async fn create_user_policy(
        &self,
        policy_name: &str,
        access_key: &str,
        bucket: &str,
    ) -> Result<()> {
        let document = policy::bucket_policy(access_key, bucket)?;
        self.admin.add_canned_policy(policy_name, document).await
    }

    async fn bind_policy(&self, access_key: &str, policy_name: &str) -> Result<()> {
        self.admin.set_user_policy(access_key, policy_name).await
    }

    async fn remove_user(&self, access_key: &str) -> Result<()> {
        self.admin.remove_user(access_key).await
    }

    async fn remove_policy(&self, policy_name: &str) -> Result<()> {
        self.admin.remove_canned_policy(policy_name).await
    }

    async fn remove_bucket(&self, bucket: &str) -> Result<()> {
        self.s3
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| Error::ObjectStore(format!("remove bucket {bucket}: {e}")))?;
        Ok(())
    }
}

/// Name under which a bucket's canned policy is registered.
pub fn policy_name(access_key: &str, bucket: &str) -> String {
    format!("{access_key}-{bucket}")
}
