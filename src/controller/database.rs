//! # Database Reconciler
//!
//! Drives a Database resource from declaration to a provisioned database
//! with a dedicated role and a published credential secret, and tears all
//! of it down again when the resource is deleted.
//!
//! Provisioning order: resolve the admin connection, create the role
//! (idempotent), create the database and grant the role (idempotent),
//! verify by connecting as the new role, publish the secret, record the
//! credential on the spec, then flip Available. The finalizer is attached
//! before the first backend side effect so a crash between steps can
//! always be cleaned up.

use kube::api::{Api, Patch, PatchParams};
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::constants::{DATABASE_FINALIZER, SECRET_KEY_PASSWORD, SECRET_KEY_USERNAME};
use crate::controller::context::Context;
use crate::controller::{finalizer, resolve, secret, status};
use crate::crd::{Database, DatabaseConnection, StatusConditions};
use crate::error::{Error, Result};
use crate::provision::{credentials, sql, Dsn};

pub async fn reconcile(obj: Arc<Database>, ctx: Arc<Context>) -> Result<Action> {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<Database> = Api::namespaced(ctx.client.clone(), &namespace);

    // The watch event may be stale; a concurrent delete is not an error
    let Some(mut database) = api.get_opt(&name).await? else {
        debug!(resource = %name, "database already deleted, nothing to do");
        return Ok(Action::await_change());
    };

    if database.metadata.deletion_timestamp.is_some() {
        if finalizer::has_finalizer(&database, DATABASE_FINALIZER) {
            deprovision(&ctx, &database, &namespace).await?;
            finalizer::remove(&api, &database, DATABASE_FINALIZER).await?;
            info!(resource = %format!("{namespace}/{name}"), "database deprovisioned");
        }
        return Ok(Action::await_change());
    }

    if database.needs_condition_reset() {
        status::update_status(
            &api,
            &name,
            ctx.config.status_update_retries,
            |latest: &mut Database| latest.init_conditions("Database"),
        )
        .await?;
        // the Available check below must see the reset, not the stale view
        database.init_conditions("Database");
    }

    // Cleanup guard must exist before anything is created on the backend
    finalizer::add(&api, &database, DATABASE_FINALIZER).await?;

    if database.is_available() {
        return Ok(Action::await_change());
    }

    let connection =
        resolve::database_connection(&ctx.client, &namespace, &database.spec.reference, &name)
            .await?;
    provision(&ctx, &database, &connection, &namespace).await?;

    status::update_status(
        &api,
        &name,
        ctx.config.status_update_retries,
        |latest: &mut Database| latest.set_available("database is running"),
    )
    .await?;
    ctx.reset_backoff(&namespace, &name);
    info!(resource = %format!("{namespace}/{name}"), "database provisioned");
    Ok(Action::await_change())
}

async fn provision(
    ctx: &Context,
    database: &Database,
    connection: &DatabaseConnection,
    namespace: &str,
) -> Result<()> {
    let name = database.name_any();
    let db_name = database.spec.name.as_str();
    if db_name.is_empty() {
        return Err(Error::Validation(format!(
            "database {namespace}/{name} has no database name"
        )));
    }

    let username = credentials::principal_name(&name);
    let password = credentials::password();

    let admin_dsn = resolve::admin_dsn(&ctx.client, connection).await?;
    let mut admin = sql::connect(&admin_dsn).await?;
    admin.init_user(&username, &password).await?;
    admin.init_database(&username, db_name).await?;

    // Open a fresh connection as the new principal against the new
    // database; the credentials are only published once this succeeds
    let probe_dsn = Dsn {
        driver: admin_dsn.driver,
        host: admin_dsn.host.clone(),
        port: admin_dsn.port,
        ssl: admin_dsn.ssl,
        username: username.clone(),
        password: password.clone(),
        database: db_name.to_string(),
    };
    let mut probe = sql::connect(&probe_dsn).await?;
    probe.ping().await?;

    let secret_name = database.secret_name();
    let mut data = BTreeMap::new();
    data.insert(SECRET_KEY_USERNAME.to_string(), username.clone().into_bytes());
    data.insert(SECRET_KEY_PASSWORD.to_string(), password.into_bytes());
    secret::publish(&ctx.client, namespace, &secret_name, data).await?;

    // Record where the credential lives so deletion can find the principal
    let api: Api<Database> = Api::namespaced(ctx.client.clone(), namespace);
    let patch = serde_json::json!({
        "spec": {"credential": {"existingSecret": secret_name, "username": username}}
    });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

async fn deprovision(ctx: &Context, database: &Database, namespace: &str) -> Result<()> {
    let name = database.name_any();
    let connection =
        resolve::database_connection(&ctx.client, namespace, &database.spec.reference, &name)
            .await?;
    let admin_dsn = resolve::admin_dsn(&ctx.client, &connection).await?;
    let mut admin = sql::connect(&admin_dsn).await?;

    if !database.spec.name.is_empty() {
        admin.drop_database(&database.spec.name).await?;
    }

    let credential = database.spec.credential.clone().unwrap_or_default();
    let mut username = credential.username.unwrap_or_default();
    if let Some(secret_name) = credential.existing_secret.as_deref() {
        match secret::read_keys(&ctx.client, namespace, secret_name).await {
            Ok(data) => {
                if let Some(stored) = data.get(SECRET_KEY_USERNAME) {
                    username = stored.clone();
                }
            }
            // Secret already cleaned up on an earlier attempt
            Err(Error::Kube(kube::Error::Api(ae))) if ae.code == 404 => {}
            Err(e) => return Err(e),
        }
        secret::delete(&ctx.client, namespace, secret_name).await?;
    }

    if username.is_empty() {
        warn!(
            resource = %format!("{namespace}/{name}"),
            "no recorded principal, skipping user drop"
        );
        return Ok(());
    }
    admin.drop_user(&username).await
}
