//! # Runtime
//!
//! Watch loops for the five resource kinds and the shared error policy.
//! Each kind gets its own `Controller`; the external framework guarantees
//! at most one concurrent reconcile per resource identity.

pub mod backoff;

use futures::StreamExt;
use kube::api::Api;
use kube::{Client, Resource};
use kube_runtime::{controller::Action, watcher, Controller};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::controller::{
    self, database, database_connection, redis_connection, s3_bucket, s3_connection, Context,
};
use crate::crd::{Database, DatabaseConnection, RedisConnection, S3Bucket, S3Connection};
use crate::error::Error;

/// Run all controllers until shutdown.
pub async fn run(client: Client, config: ControllerConfig) -> anyhow::Result<()> {
    let ctx = Arc::new(Context::new(client.clone(), config));
    info!("starting controllers");

    let databases = Controller::new(
        Api::<Database>::all(client.clone()),
        watcher::Config::default().any_semantic(),
    )
    .shutdown_on_signal()
    .run(database::reconcile, error_policy, ctx.clone())
    .for_each(|result| async move {
        match result {
            Ok((obj, _)) => debug!(resource = %obj, "reconciled Database"),
            Err(err) => warn!(error = %err, "Database reconcile failed"),
        }
    });

    let database_connections = Controller::new(
        Api::<DatabaseConnection>::all(client.clone()),
        watcher::Config::default().any_semantic(),
    )
    .shutdown_on_signal()
    .run(database_connection::reconcile, error_policy, ctx.clone())
    .for_each(|result| async move {
        match result {
            Ok((obj, _)) => debug!(resource = %obj, "reconciled DatabaseConnection"),
            Err(err) => warn!(error = %err, "DatabaseConnection reconcile failed"),
        }
    });

    let redis_connections = Controller::new(
        Api::<RedisConnection>::all(client.clone()),
        watcher::Config::default().any_semantic(),
    )
    .shutdown_on_signal()
    .run(redis_connection::reconcile, error_policy, ctx.clone())
    .for_each(|result| async move {
        match result {
            Ok((obj, _)) => debug!(resource = %obj, "reconciled RedisConnection"),
            Err(err) => warn!(error = %err, "RedisConnection reconcile failed"),
        }
    });

    let s3_buckets = Controller::new(
        Api::<S3Bucket>::all(client.clone()),
        watcher::Config::default().any_semantic(),
    )
    .shutdown_on_signal()
    .run(s3_bucket::reconcile, error_policy, ctx.clone())
    .for_each(|result| async move {
        match result {
            Ok((obj, _)) => debug!(resource = %obj, "reconciled S3Bucket"),
            Err(err) => warn!(error = %err, "S3Bucket reconcile failed"),
        }
    });

    let s3_connections = Controller::new(
        Api::<S3Connection>::all(client.clone()),
        watcher::Config::default().any_semantic(),
    )
    .shutdown_on_signal()
    .run(s3_connection::reconcile, error_policy, ctx)
    .for_each(|result| async move {
        match result {
            Ok((obj, _)) => debug!(resource = %obj, "reconciled S3Connection"),
            Err(err) => warn!(error = %err, "S3Connection reconcile failed"),
        }
    });

    futures::join!(
        databases,
        database_connections,
        redis_connections,
        s3_buckets,
        s3_connections
    );
    info!("controllers stopped");
    Ok(())
}

/// Shared error policy.
///
/// Validation-class errors halt the resource until its spec changes;
/// everything else retries with per-resource Fibonacci backoff.
pub fn error_policy<K>(obj: Arc<K>, error: &Error, ctx: Arc<controller::Context>) -> Action
where
    K: Resource<DynamicType = ()>,
{
    let name = obj.meta().name.as_deref().unwrap_or("unknown");
    let namespace = obj.meta().namespace.as_deref().unwrap_or("default");
    let resource = format!("{namespace}/{name}");

    if error.is_terminal() {
        warn!(resource = %resource, error = %error, "terminal reconcile error, waiting for spec change");
        return Action::await_change();
    }

    let delay = ctx.next_backoff(namespace, name);
    warn!(
        resource = %resource,
        error = %error,
        retry_in_secs = delay.as_secs(),
        "reconcile failed, scheduling retry"
    );
    Action::requeue(delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{Database, DatabaseSpec};
    use kube::api::ObjectMeta;

    fn database() -> Arc<Database> {
        Arc::new(Database {
            metadata: ObjectMeta {
                name: Some("orders".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            spec: DatabaseSpec {
                name: "orders".to_string(),
                reference: String::new(),
                credential: None,
            },
            status: None,
        })
    }

    fn test_context() -> Arc<Context> {
        let mock = crate::test_utils::MockApiServer::new();
        Arc::new(Context::new(mock.client(), ControllerConfig::default()))
    }

    #[tokio::test]
    async fn validation_errors_are_not_requeued() {
        let action = error_policy(
            database(),
            &Error::MissingReference("default/orders".to_string()),
            test_context(),
        );
        assert_eq!(action, Action::await_change());
    }

    #[tokio::test]
    async fn retryable_errors_back_off_progressively() {
        let ctx = test_context();
        let err = Error::Connectivity("dial timeout".to_string());

        let first = error_policy(database(), &err, ctx.clone());
        let second = error_policy(database(), &err, ctx.clone());
        let third = error_policy(database(), &err, ctx.clone());

        assert_eq!(first, Action::requeue(std::time::Duration::from_secs(30)));
        assert_eq!(second, Action::requeue(std::time::Duration::from_secs(30)));
        assert_eq!(third, Action::requeue(std::time::Duration::from_secs(60)));

        // success resets the sequence
        ctx.reset_backoff("default", "orders");
        let after_reset = error_policy(database(), &err, ctx);
        assert_eq!(
            after_reset,
            Action::requeue(std::time::Duration::from_secs(30))
        );
    }
}
