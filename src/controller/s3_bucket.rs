//! # S3Bucket Reconciler
//!
//! Drives an S3Bucket resource to a provisioned bucket with a dedicated
//! access-key principal, a bound per-bucket policy, and a published
//! credential secret; tears everything down on deletion.

use kube::api::{Api, Patch, PatchParams};
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::constants::{S3BUCKET_FINALIZER, SECRET_KEY_ACCESS_KEY, SECRET_KEY_SECRET_KEY};
use crate::controller::context::Context;
use crate::controller::{finalizer, resolve, secret, status};
use crate::crd::{S3Bucket, StatusConditions};
use crate::error::{Error, Result};
use crate::provision::credentials;
use crate::provision::s3::{self, MinioProvisioner, ObjectStoreProvisioner};

pub async fn reconcile(obj: Arc<S3Bucket>, ctx: Arc<Context>) -> Result<Action> {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<S3Bucket> = Api::namespaced(ctx.client.clone(), &namespace);

    let Some(mut bucket) = api.get_opt(&name).await? else {
        debug!(resource = %name, "bucket already deleted, nothing to do");
        return Ok(Action::await_change());
    };

    if bucket.metadata.deletion_timestamp.is_some() {
        if finalizer::has_finalizer(&bucket, S3BUCKET_FINALIZER) {
            deprovision(&ctx, &bucket, &namespace).await?;
            finalizer::remove(&api, &bucket, S3BUCKET_FINALIZER).await?;
            info!(resource = %format!("{namespace}/{name}"), "bucket deprovisioned");
        }
        return Ok(Action::await_change());
    }

    if bucket.needs_condition_reset() {
        status::update_status(
            &api,
            &name,
            ctx.config.status_update_retries,
            |latest: &mut S3Bucket| latest.init_conditions("S3Bucket"),
        )
        .await?;
        // the Available check below must see the reset, not the stale view
        bucket.init_conditions("S3Bucket");
    }

    // Cleanup guard must exist before anything is created on the backend
    finalizer::add(&api, &bucket, S3BUCKET_FINALIZER).await?;

    if bucket.is_available() {
        return Ok(Action::await_change());
    }

    provision(&ctx, &bucket, &namespace).await?;

    status::update_status(
        &api,
        &name,
        ctx.config.status_update_retries,
        |latest: &mut S3Bucket| latest.set_available("bucket is running"),
    )
    .await?;
    ctx.reset_backoff(&namespace, &name);
    info!(resource = %format!("{namespace}/{name}"), "bucket provisioned");
    Ok(Action::await_change())
}

async fn provision(ctx: &Context, bucket: &S3Bucket, namespace: &str) -> Result<()> {
    let name = bucket.name_any();
    let bucket_name = bucket.spec.name.as_str();
    if bucket_name.is_empty() {
        return Err(Error::Validation(format!(
            "bucket {namespace}/{name} has no bucket name"
        )));
    }

    let connection =
        resolve::s3_connection(&ctx.client, namespace, &bucket.spec.reference, &name).await?;
    let config = resolve::admin_store_config(&ctx.client, &connection).await?;
    let provisioner = MinioProvisioner::new(&config)?;

    provisioner.create_bucket(bucket_name).await?;

    let access_key = credentials::principal_name(&name);
    let secret_key = credentials::secret_access_key();
    provisioner.create_user(&access_key, &secret_key).await?;

    let policy_name = s3::policy_name(&access_key, bucket_name);
    provisioner
        .create_user_policy(&policy_name, &access_key, bucket_name)
        .await?;
    provisioner.bind_policy(&access_key, &policy_name).await?;

    let secret_name = bucket.secret_name();
    let mut data = BTreeMap::new();
    data.insert(
        SECRET_KEY_ACCESS_KEY.to_string(),
        access_key.clone().into_bytes(),
    );
    data.insert(SECRET_KEY_SECRET_KEY.to_string(), secret_key.into_bytes());
    secret::publish(&ctx.client, namespace, &secret_name, data).await?;

    // Record where the credential lives so deletion can find the principal
    let api: Api<S3Bucket> = Api::namespaced(ctx.client.clone(), namespace);
    let patch = serde_json::json!({
        "spec": {"credential": {"existingSecret": secret_name}}
    });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

async fn deprovision(ctx: &Context, bucket: &S3Bucket, namespace: &str) -> Result<()> {
    let name = bucket.name_any();
    let connection =
        resolve::s3_connection(&ctx.client, namespace, &bucket.spec.reference, &name).await?;
    let config = resolve::admin_store_config(&ctx.client, &connection).await?;
    let provisioner = MinioProvisioner::new(&config)?;

    let Some(secret_name) = bucket
        .spec
        .credential
        .as_ref()
        .and_then(|c| c.existing_secret.clone())
    else {
        // No credential was ever recorded, so provisioning never finished
        warn!(
            resource = %format!("{namespace}/{name}"),
            "no recorded credential, skipping principal teardown"
        );
        return Ok(());
    };

    let access_key = match secret::read_keys(&ctx.client, namespace, &secret_name).await {
        Ok(data) => data
            .get(SECRET_KEY_ACCESS_KEY)
            .cloned()
            .unwrap_or_default(),
        // Secret already cleaned up on an earlier attempt
        Err(Error::Kube(kube::Error::Api(ae))) if ae.code == 404 => String::new(),
        Err(e) => return Err(e),
    };

    if !access_key.is_empty() {
        provisioner.remove_user(&access_key).await?;
        provisioner
            .remove_policy(&s3::policy_name(&access_key, &bucket.spec.name))
            .await?;
    }
    if !bucket.spec.name.is_empty() {
        provisioner.remove_bucket(&bucket.spec.name).await?;
    }
    secret::delete(&ctx.client, namespace, &secret_name).await
}
