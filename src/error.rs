//! # Errors
//!
//! Error taxonomy for the reconcilers and provisioning drivers.
//!
//! Validation-class errors (missing reference, empty names, duplicate
//! default connections) are never retried automatically; the runtime error
//! policy parks the resource until its spec changes. Everything else is
//! surfaced to the dispatcher, which requeues with backoff.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The resource names no connection to provision against
    #[error("missing connection reference on {0}")]
    MissingReference(String),

    /// The spec is incomplete or malformed in a way a retry cannot fix
    #[error("invalid spec: {0}")]
    Validation(String),

    /// No credential material is recorded where some is required
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// Another connection is already the default for this driver
    #[error("default connection already exists for driver {driver} in {namespace}")]
    DuplicateDefault { driver: String, namespace: String },

    /// Status update kept conflicting with a concurrent writer
    #[error("status update conflict not resolved after {retries} attempts")]
    StatusConflict { retries: u32 },

    /// Ping, dial, or client construction failed
    #[error("connectivity check failed: {0}")]
    Connectivity(String),

    /// The backend is in a state the reconciler cannot act on
    #[error("unexpected backend state: {0}")]
    BackendState(String),

    /// Object-store admin API rejected a request
    #[error("object storage error: {0}")]
    ObjectStore(String),

    #[error("database error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),

    /// A stored secret value could not be decoded
    #[error("secret decode error: {0}")]
    SecretDecode(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Validation-class errors halt a resource until its spec is fixed;
    /// the error policy must not requeue them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Error::MissingReference(_)
                | Error::Validation(_)
                | Error::MissingCredential(_)
                | Error::DuplicateDefault { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
