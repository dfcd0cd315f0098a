//! # Constants
//!
//! Finalizer names, secret payload keys, and configuration defaults.

/// Finalizer guarding Database teardown
pub const DATABASE_FINALIZER: &str = "database.finalizers.stack.datastack.dev";
/// Finalizer guarding S3Bucket teardown
pub const S3BUCKET_FINALIZER: &str = "s3bucket.finalizers.stack.datastack.dev";

/// Secret payload keys for relational credentials
pub const SECRET_KEY_USERNAME: &str = "username";
pub const SECRET_KEY_PASSWORD: &str = "password";

/// Secret payload keys for object-store credentials and connection material
pub const SECRET_KEY_ACCESS_KEY: &str = "accessKey";
pub const SECRET_KEY_SECRET_KEY: &str = "secretKey";
pub const SECRET_KEY_ENDPOINT: &str = "endpoint";
pub const SECRET_KEY_REGION: &str = "region";
pub const SECRET_KEY_SSL: &str = "ssl";

/// Random suffix length appended to generated principal names
pub const PRINCIPAL_SUFFIX_LEN: usize = 5;
/// Generated password length for relational principals
pub const PASSWORD_LEN: usize = 10;
/// Raw byte length of generated object-store secret keys (before base64)
pub const SECRET_ACCESS_KEY_LEN: usize = 40;

/// Default requeue delay after a retryable reconcile error (seconds)
pub const DEFAULT_ERROR_REQUEUE_SECS: u64 = 30;
/// Default minimum backoff between retries of a failing resource (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 30;
/// Default maximum backoff between retries of a failing resource (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 600;
/// Default bound on optimistic-concurrency status update retries
pub const DEFAULT_STATUS_UPDATE_RETRIES: u32 = 5;
