//! # DatabaseConnection Reconciler
//!
//! Validates the namespace's default-connection invariant, verifies
//! admin connectivity with a ping, and records the result in the status
//! conditions.

use kube::api::{Api, ListParams};
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{debug, info};

use crate::controller::context::Context;
use crate::controller::{resolve, status};
use crate::crd::{
    Condition, DatabaseConnection, StatusConditions, CONDITION_FALSE, CONDITION_REASON_PREPARING,
    CONDITION_TYPE_RECONCILE,
};
use crate::error::{Error, Result};
use crate::provision::sql;

pub async fn reconcile(obj: Arc<DatabaseConnection>, ctx: Arc<Context>) -> Result<Action> {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<DatabaseConnection> = Api::namespaced(ctx.client.clone(), &namespace);

    let Some(mut connection) = api.get_opt(&name).await? else {
        debug!(resource = %name, "connection already deleted, nothing to do");
        return Ok(Action::await_change());
    };

    if connection.needs_condition_reset() {
        status::update_status(
            &api,
            &name,
            ctx.config.status_update_retries,
            |latest: &mut DatabaseConnection| latest.init_conditions("DatabaseConnection"),
        )
        .await?;
        connection.init_conditions("DatabaseConnection");
    }

    if let Err(err) = check_default(&ctx.client, &connection).await {
        if matches!(err, Error::DuplicateDefault { .. }) {
            status::update_status(
                &api,
                &name,
                ctx.config.status_update_retries,
                |latest: &mut DatabaseConnection| {
                    latest.set_condition(Condition::new(
                        CONDITION_TYPE_RECONCILE,
                        CONDITION_FALSE,
                        CONDITION_REASON_PREPARING,
                        "another default connection exists for this driver",
                    ));
                },
            )
            .await?;
        }
        return Err(err);
    }

    let dsn = resolve::admin_dsn(&ctx.client, &connection).await?;
    let mut driver = sql::connect(&dsn).await?;
    driver.ping().await?;

    if connection.is_available() {
        return Ok(Action::await_change());
    }

    status::update_status(
        &api,
        &name,
        ctx.config.status_update_retries,
        |latest: &mut DatabaseConnection| latest.set_available("database connection is running"),
    )
    .await?;
    ctx.reset_backoff(&namespace, &name);
    info!(resource = %format!("{namespace}/{name}"), "database connection verified");
    Ok(Action::await_change())
}

/// At most one default connection per (namespace, driver) pair.
pub async fn check_default(client: &kube::Client, connection: &DatabaseConnection) -> Result<()> {
    if !connection.spec.default {
        return Ok(());
    }
    let namespace = connection.namespace().unwrap_or_default();
    let api: Api<DatabaseConnection> = Api::namespaced(client.clone(), &namespace);
    let list = api.list(&ListParams::default()).await?;
    for item in list.items {
        if item.spec.default
            && item.name_any() != connection.name_any()
            && item.spec.provider.driver == connection.spec.provider.driver
        {
            return Err(Error::DuplicateDefault {
                driver: connection.spec.provider.driver.to_string(),
                namespace,
            });
        }
    }
    Ok(())
}
