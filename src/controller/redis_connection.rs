//! # RedisConnection Reconciler
//!
//! Verifies cache connectivity with a PING and records the result in the
//! status conditions.

use kube::api::Api;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{debug, info};

use crate::controller::context::Context;
use crate::controller::status;
use crate::crd::{RedisConnection, StatusConditions};
use crate::error::Result;
use crate::provision::redis::{self, CacheConfig};

pub async fn reconcile(obj: Arc<RedisConnection>, ctx: Arc<Context>) -> Result<Action> {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<RedisConnection> = Api::namespaced(ctx.client.clone(), &namespace);

    let Some(mut connection) = api.get_opt(&name).await? else {
        debug!(resource = %name, "connection already deleted, nothing to do");
        return Ok(Action::await_change());
    };

    if connection.needs_condition_reset() {
        status::update_status(
            &api,
            &name,
            ctx.config.status_update_retries,
            |latest: &mut RedisConnection| latest.init_conditions("RedisConnection"),
        )
        .await?;
        connection.init_conditions("RedisConnection");
    }

    redis::check_connection(&CacheConfig {
        host: connection.spec.host.clone(),
        port: connection.spec.port,
        username: None,
        password: connection.spec.password.clone(),
    })
    .await?;

    if connection.is_available() {
        return Ok(Action::await_change());
    }

    status::update_status(
        &api,
        &name,
        ctx.config.status_update_retries,
        |latest: &mut RedisConnection| latest.set_available("redis connection is running"),
    )
    .await?;
    ctx.reset_backoff(&namespace, &name);
    info!(resource = %format!("{namespace}/{name}"), "redis connection verified");
    Ok(Action::await_change())
}
