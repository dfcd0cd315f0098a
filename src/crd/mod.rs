//! # Custom Resource Definitions
//!
//! CRD types for the datastack operator: the two managed kinds (Database,
//! S3Bucket) and the three connection kinds they reference, plus the shared
//! status-condition machinery.

pub mod conditions;

mod database;
mod database_connection;
mod redis_connection;
mod s3_bucket;
mod s3_connection;

pub use conditions::{
    Condition, StatusConditions, CONDITION_FALSE, CONDITION_REASON_PREPARING,
    CONDITION_REASON_RUNNING, CONDITION_TRUE, CONDITION_TYPE_AVAILABLE,
    CONDITION_TYPE_PROGRESSING, CONDITION_TYPE_RECONCILE,
};
pub use database::{Database, DatabaseCredential, DatabaseSpec, DatabaseStatus};
pub use database_connection::{
    ConnectionCredential, DatabaseConnection, DatabaseConnectionSpec, DatabaseConnectionStatus,
    DatabaseProvider, DbDriver,
};
pub use redis_connection::{RedisConnection, RedisConnectionSpec, RedisConnectionStatus};
pub use s3_bucket::{S3Bucket, S3BucketCredential, S3BucketSpec, S3BucketStatus};
pub use s3_connection::{S3Connection, S3ConnectionSpec, S3ConnectionStatus, S3Credential};
