//! Datastack Operator Library
//!
//! Reconciles Database, DatabaseConnection, RedisConnection, S3Bucket and
//! S3Connection resources against relational databases, a Redis cache and
//! S3-compatible object stores, provisioning scoped principals and
//! publishing their credentials as Secrets.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod error;
pub mod observability;
pub mod provision;
pub mod runtime;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{Error, Result};
