//! # Reconciliation Core
//!
//! One reconciler per resource kind plus the pieces they share: the
//! connection resolver, the secret publisher, conflict-retried status
//! updates, and finalizer bookkeeping.

pub mod context;
pub mod database;
pub mod database_connection;
pub mod finalizer;
pub mod redis_connection;
pub mod resolve;
pub mod s3_bucket;
pub mod s3_connection;
pub mod secret;
pub mod status;

pub use context::Context;
