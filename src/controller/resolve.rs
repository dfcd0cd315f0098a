//! # Connection Resolver
//!
//! Resolves a managed resource's `reference` to its connection object and
//! extracts endpoint plus credential material, reading a referenced secret
//! when one is named and falling back to the inline fields otherwise.
//! Read-only: nothing here talks to a backend.

use kube::api::Api;
use kube::{Client, ResourceExt};

use crate::constants::{
    SECRET_KEY_ACCESS_KEY, SECRET_KEY_ENDPOINT, SECRET_KEY_PASSWORD, SECRET_KEY_REGION,
    SECRET_KEY_SECRET_KEY, SECRET_KEY_SSL, SECRET_KEY_USERNAME,
};
use crate::controller::secret;
use crate::crd::{DatabaseConnection, S3Connection};
use crate::error::{Error, Result};
use crate::provision::s3::StoreConfig;
use crate::provision::Dsn;

/// Look up the DatabaseConnection a resource references.
pub async fn database_connection(
    client: &Client,
    namespace: &str,
    reference: &str,
    holder: &str,
) -> Result<DatabaseConnection> {
    if reference.is_empty() {
        return Err(Error::MissingReference(format!("{namespace}/{holder}")));
    }
    let api: Api<DatabaseConnection> = Api::namespaced(client.clone(), namespace);
    Ok(api.get(reference).await?)
}

/// Look up the S3Connection a resource references.
pub async fn s3_connection(
    client: &Client,
    namespace: &str,
    reference: &str,
    holder: &str,
) -> Result<S3Connection> {
    if reference.is_empty() {
        return Err(Error::MissingReference(format!("{namespace}/{holder}")));
    }
    let api: Api<S3Connection> = Api::namespaced(client.clone(), namespace);
    Ok(api.get(reference).await?)
}

/// Build the admin DSN for a connection, pulling `username`/`password`
/// from the referenced secret when one is named.
pub async fn admin_dsn(client: &Client, connection: &DatabaseConnection) -> Result<Dsn> {
    let provider = &connection.spec.provider;
    let mut dsn = Dsn {
        driver: provider.driver,
        host: provider.host.clone(),
        port: provider.port,
        ssl: provider.ssl,
        ..Default::default()
    };
    let Some(credential) = &provider.credential else {
        return Ok(dsn);
    };
    if let Some(secret_name) = credential.existing_secret.as_deref() {
        let namespace = connection.namespace().unwrap_or_default();
        let data = secret::read_keys(client, &namespace, secret_name).await?;
        if let Some(username) = data.get(SECRET_KEY_USERNAME) {
            dsn.username = username.clone();
        }
        if let Some(password) = data.get(SECRET_KEY_PASSWORD) {
            dsn.password = password.clone();
        }
    } else {
        dsn.username = credential.username.clone().unwrap_or_default();
        dsn.password = credential.password.clone().unwrap_or_default();
    }
    Ok(dsn)
}

/// Build the admin store config for an S3 connection, pulling connection
/// material from the referenced secret when one is named.
pub async fn admin_store_config(client: &Client, connection: &S3Connection) -> Result<StoreConfig> {
    let credential = &connection.spec.credential;
    if let Some(secret_name) = credential.existing_secret.as_deref() {
        let namespace = connection.namespace().unwrap_or_default();
        let data = secret::read_keys(client, &namespace, secret_name).await?;
        let get = |key: &str| data.get(key).cloned().unwrap_or_default();
        Ok(StoreConfig {
            endpoint: get(SECRET_KEY_ENDPOINT),
            access_key: get(SECRET_KEY_ACCESS_KEY),
            secret_key: get(SECRET_KEY_SECRET_KEY),
            region: get(SECRET_KEY_REGION),
            ssl: data.get(SECRET_KEY_SSL).map(String::as_str) == Some("true"),
        })
    } else {
        Ok(StoreConfig {
            endpoint: credential.endpoint.clone(),
            access_key: credential.access_key.clone(),
            secret_key: credential.secret_key.clone(),
            region: credential.region.clone(),
            ssl: credential.ssl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::DbDriver;
    use crate::test_utils::{database_connection_json, MockApiServer};

    #[tokio::test]
    async fn empty_reference_fails_without_any_api_call() {
        let mock = MockApiServer::new();
        let client = mock.client();

        let err = database_connection(&client, "default", "", "orders")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingReference(_)));
        assert!(mock.requests().is_empty());

        let err = s3_connection(&client, "default", "", "logs")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingReference(_)));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn resolves_named_connection() {
        let mock = MockApiServer::new().on(
            "GET",
            "/apis/stack.datastack.dev/v1alpha1/namespaces/default/databaseconnections/postgres-main",
            200,
            &database_connection_json("postgres-main", "postgres", false),
        );
        let client = mock.client();

        let connection = database_connection(&client, "default", "postgres-main", "orders")
            .await
            .unwrap();
        assert_eq!(connection.spec.provider.driver, DbDriver::Postgres);
        assert_eq!(connection.spec.provider.host, "127.0.0.1");
    }

    #[tokio::test]
    async fn inline_credentials_are_used_verbatim() {
        let mock = MockApiServer::new().on(
            "GET",
            "/apis/stack.datastack.dev/v1alpha1/namespaces/default/databaseconnections/postgres-main",
            200,
            &database_connection_json("postgres-main", "postgres", false),
        );
        let client = mock.client();
        let connection = database_connection(&client, "default", "postgres-main", "orders")
            .await
            .unwrap();

        let dsn = admin_dsn(&client, &connection).await.unwrap();
        assert_eq!(dsn.username, "root");
        assert_eq!(dsn.password, "123456");
        assert_eq!(dsn.port, 5432);
        // no secret fetch happened, only the connection lookup
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn secret_reference_overrides_inline_fields() {
        let connection_json = r#"{
            "apiVersion": "stack.datastack.dev/v1alpha1",
            "kind": "DatabaseConnection",
            "metadata": {"name": "pg", "namespace": "default", "generation": 1},
            "spec": {"provider": {"driver": "postgres", "host": "db", "port": 5432,
                     "credential": {"existingSecret": "pg-admin"}}}
        }"#;
        let mock = MockApiServer::new()
            .on(
                "GET",
                "/apis/stack.datastack.dev/v1alpha1/namespaces/default/databaseconnections/pg",
                200,
                connection_json,
            )
            .on(
                "GET",
                "/api/v1/namespaces/default/secrets/pg-admin",
                200,
                r#"{"apiVersion":"v1","kind":"Secret","metadata":{"name":"pg-admin","namespace":"default"},"data":{"username":"YWRtaW4=","password":"c2VjcmV0"}}"#,
            );
        let client = mock.client();

        let connection = database_connection(&client, "default", "pg", "orders")
            .await
            .unwrap();
        let dsn = admin_dsn(&client, &connection).await.unwrap();
        assert_eq!(dsn.username, "admin");
        assert_eq!(dsn.password, "secret");
    }

    #[tokio::test]
    async fn store_config_tolerates_missing_secret_keys() {
        let connection_json = r#"{
            "apiVersion": "stack.datastack.dev/v1alpha1",
            "kind": "S3Connection",
            "metadata": {"name": "minio", "namespace": "default", "generation": 1},
            "spec": {"credential": {"existingSecret": "minio-admin"}}
        }"#;
        let mock = MockApiServer::new()
            .on(
                "GET",
                "/apis/stack.datastack.dev/v1alpha1/namespaces/default/s3connections/minio",
                200,
                connection_json,
            )
            .on(
                "GET",
                "/api/v1/namespaces/default/secrets/minio-admin",
                200,
                // endpoint + accessKey only; secretKey/region/ssl left blank
                r#"{"apiVersion":"v1","kind":"Secret","metadata":{"name":"minio-admin","namespace":"default"},"data":{"endpoint":"MTI3LjAuMC4xOjkwMDA=","accessKey":"YWRtaW4="}}"#,
            );
        let client = mock.client();

        let connection = s3_connection(&client, "default", "minio", "logs")
            .await
            .unwrap();
        let config = admin_store_config(&client, &connection).await.unwrap();
        assert_eq!(config.endpoint, "127.0.0.1:9000");
        assert_eq!(config.access_key, "admin");
        assert_eq!(config.secret_key, "");
        assert!(!config.ssl);
    }
}
