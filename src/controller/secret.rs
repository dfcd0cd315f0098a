//! # Secret Publisher
//!
//! Create-or-update publication of generated credentials, plus reading and
//! deleting credential secrets. Base64 encoding is handled at the API
//! boundary by the platform; this module only ever sees raw bytes.

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{Api, DeleteParams, ObjectMeta, PostParams};
use kube::Client;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{Error, Result};

/// Write an Opaque secret, replacing any existing one with the same name.
pub async fn publish(
    client: &Client,
    namespace: &str,
    name: &str,
    data: BTreeMap<String, Vec<u8>>,
) -> Result<()> {
    let api: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let secret = Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(data.into_iter().map(|(k, v)| (k, ByteString(v))).collect()),
        ..Default::default()
    };
    match api.get_opt(name).await? {
        Some(existing) => {
            let mut desired = secret;
            desired.metadata.resource_version = existing.metadata.resource_version;
            api.replace(name, &PostParams::default(), &desired).await?;
            debug!(secret = %format!("{namespace}/{name}"), "updated credential secret");
        }
        None => {
            api.create(&PostParams::default(), &secret).await?;
            debug!(secret = %format!("{namespace}/{name}"), "created credential secret");
        }
    }
    Ok(())
}

/// Read a secret's data as UTF-8 strings. Missing keys are simply absent
/// from the map; undecodable values are fatal.
pub async fn read_keys(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<BTreeMap<String, String>> {
    let api: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let secret = api.get(name).await?;
    let mut out = BTreeMap::new();
    for (key, ByteString(bytes)) in secret.data.unwrap_or_default() {
        let value = String::from_utf8(bytes).map_err(|_| {
            Error::SecretDecode(format!(
                "secret {namespace}/{name} key {key} is not valid UTF-8"
            ))
        })?;
        out.insert(key, value);
    }
    Ok(out)
}

/// Delete a secret, tolerating one that is already gone.
pub async fn delete(client: &Client, namespace: &str, name: &str) -> Result<()> {
    let api: Api<Secret> = Api::namespaced(client.clone(), namespace);
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockApiServer;

    #[tokio::test]
    async fn publish_creates_when_absent() {
        let mock = MockApiServer::new().on(
            "POST",
            "/api/v1/namespaces/default/secrets",
            201,
            r#"{"apiVersion":"v1","kind":"Secret","metadata":{"name":"orders-secret","namespace":"default"}}"#,
        );
        let client = mock.client();

        let mut data = BTreeMap::new();
        data.insert("username".to_string(), b"app1".to_vec());
        publish(&client, "default", "orders-secret", data)
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].0, "GET");
        assert_eq!(requests[1].0, "POST");
    }

    #[tokio::test]
    async fn read_keys_decodes_present_keys() {
        // data values arrive base64 encoded on the wire
        let mock = MockApiServer::new().on(
            "GET",
            "/api/v1/namespaces/default/secrets/orders-secret",
            200,
            r#"{"apiVersion":"v1","kind":"Secret","metadata":{"name":"orders-secret","namespace":"default"},"data":{"username":"YXBwMQ==","password":"cHc="}}"#,
        );
        let client = mock.client();

        let keys = read_keys(&client, "default", "orders-secret").await.unwrap();
        assert_eq!(keys.get("username").map(String::as_str), Some("app1"));
        assert_eq!(keys.get("password").map(String::as_str), Some("pw"));
        assert!(!keys.contains_key("endpoint"));
    }

    #[tokio::test]
    async fn delete_tolerates_missing_secret() {
        let mock = MockApiServer::new();
        let client = mock.client();
        delete(&client, "default", "never-created").await.unwrap();
    }
}
