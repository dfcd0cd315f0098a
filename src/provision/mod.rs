//! # Provisioning Drivers
//!
//! Backend-facing building blocks used by the reconcilers: credential
//! generation, DSN handling, and the per-backend provisioning drivers
//! (relational SQL, object storage, cache connectivity).

pub mod credentials;
pub mod dsn;
pub mod redis;
pub mod s3;
pub mod sql;

pub use dsn::Dsn;
pub use sql::DatabaseProvisioner;
