//! # S3Connection Reconciler
//!
//! Resolves the admin credential material and constructs the object-store
//! clients; construction failure (missing endpoint, bad key material)
//! aborts the pass. Success is recorded in the status conditions.

use kube::api::Api;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{debug, info};

use crate::controller::context::Context;
use crate::controller::{resolve, status};
use crate::crd::{S3Connection, StatusConditions};
use crate::error::Result;
use crate::provision::s3::MinioProvisioner;

pub async fn reconcile(obj: Arc<S3Connection>, ctx: Arc<Context>) -> Result<Action> {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<S3Connection> = Api::namespaced(ctx.client.clone(), &namespace);

    let Some(mut connection) = api.get_opt(&name).await? else {
        debug!(resource = %name, "connection already deleted, nothing to do");
        return Ok(Action::await_change());
    };

    if connection.needs_condition_reset() {
        status::update_status(
            &api,
            &name,
            ctx.config.status_update_retries,
            |latest: &mut S3Connection| latest.init_conditions("S3Connection"),
        )
        .await?;
        connection.init_conditions("S3Connection");
    }

    let config = resolve::admin_store_config(&ctx.client, &connection).await?;
    MinioProvisioner::new(&config)?;

    if connection.is_available() {
        return Ok(Action::await_change());
    }

    status::update_status(
        &api,
        &name,
        ctx.config.status_update_retries,
        |latest: &mut S3Connection| latest.set_available("s3 connection is running"),
    )
    .await?;
    ctx.reset_backoff(&namespace, &name);
    info!(resource = %format!("{namespace}/{name}"), "s3 connection verified");
    Ok(Action::await_change())
}
