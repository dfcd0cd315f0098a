//! # Object-Store Admin Client
//!
//! Thin REST client for the MinIO admin API (user and canned-policy
//! management), signing each request with SigV4 using the connection's
//! admin key pair. Bucket-level operations go through the AWS SDK instead
//! (see the parent module).

use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use http::Method;
use serde::Serialize;
use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::provision::s3::StoreConfig;

const ADMIN_PREFIX: &str = "minio/admin/v3";
const SIGNING_SERVICE: &str = "s3";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddUserRequest<'a> {
    secret_key: &'a str,
    status: &'a str,
}

#[derive(Debug)]
pub struct AdminClient {
    http: reqwest::Client,
    base_url: String,
    region: String,
    credentials: Credentials,
}

impl AdminClient {
    /// Construct a client for the connection's endpoint. Fails fast on an
    /// empty endpoint or an unbuildable HTTP client; nothing is dialed yet.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(Error::Connectivity(
                "object store endpoint is empty".to_string(),
            ));
        }
        let scheme = if config.ssl { "https" } else { "http" };
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Connectivity(format!("admin http client: {e}")))?;
        Ok(Self {
            http,
            base_url: format!("{scheme}://{}", config.endpoint),
            region: config.region_or_default().to_string(),
            credentials: Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "s3connection",
            ),
        })
    }

    pub async fn add_user(&self, access_key: &str, secret_key: &str) -> Result<()> {
        let url = self.admin_url("add-user", &[("accessKey", access_key)]);
        let body = serde_json::to_vec(&AddUserRequest {
            secret_key,
            status: "enabled",
        })?;
        self.send(Method::PUT, url, body).await
    }

    pub async fn add_canned_policy(&self, name: &str, policy: Vec<u8>) -> Result<()> {
        let url = self.admin_url("add-canned-policy", &[("name", name)]);
        self.send(Method::PUT, url, policy).await
    }

    pub async fn set_user_policy(&self, access_key: &str, policy_name: &str) -> Result<()> {
        let url = self.admin_url(
            "set-user-or-group-policy",
            &[
                ("policyName", policy_name),
                ("userOrGroup", access_key),
                ("isGroup", "false"),
            ],
        );
        self.send(Method::PUT, url, Vec::new()).await
    }

    pub async fn remove_user(&self, access_key: &str) -> Result<()> {
        let url = self.admin_url("remove-user", &[("accessKey", access_key)]);
        self.send(Method::DELETE, url, Vec::new()).await
    }

    pub async fn remove_canned_policy(&self, name: &str) -> Result<()> {
        let url = self.admin_url("remove-canned-policy", &[("name", name)]);
        self.send(Method::DELETE, url, Vec::new()).await
    }

    fn admin_url(&self, operation: &str, query: &[(&str, &str)]) -> String {
        let mut url = format!("{}/{ADMIN_PREFIX}/{operation}", self.base_url);
        for (i, (key, value)) in query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(value);
        }
        url
    }

    async fn send(&self, method: Method, url: String, body: Vec<u8>) -> Result<()> {
        let identity: Identity = self.credentials.clone().into();
        let params: aws_sigv4::http_request::SigningParams = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(SIGNING_SERVICE)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| Error::ObjectStore(format!("signing params: {e}")))?
            .into();
        let signable = SignableRequest::new(
            method.as_str(),
            url.as_str(),
            std::iter::empty(),
            SignableBody::Bytes(&body),
        )
        .map_err(|e| Error::ObjectStore(format!("signable request: {e}")))?;
        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| Error::ObjectStore(format!("request signing: {e}")))?
            .into_parts();

        let mut request = self.http.request(method, &url);
        for (name, value) in instructions.headers() {
            request = request.header(name, value);
        }
        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| Error::ObjectStore(format!("admin request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::ObjectStore(format!(
                "admin api returned {status}: {detail}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AdminClient {
        AdminClient::new(&StoreConfig {
            endpoint: "127.0.0.1:9000".into(),
            access_key: "admin".into(),
            secret_key: "admin123456".into(),
            region: String::new(),
            ssl: false,
        })
        .unwrap()
    }

    #[test]
    fn admin_urls() {
        let client = client();
        assert_eq!(
            client.admin_url("add-user", &[("accessKey", "app1abcde")]),
            "http://127.0.0.1:9000/minio/admin/v3/add-user?accessKey=app1abcde"
        );
        assert_eq!(
            client.admin_url(
                "set-user-or-group-policy",
                &[("policyName", "p"), ("userOrGroup", "u"), ("isGroup", "false")]
            ),
            "http://127.0.0.1:9000/minio/admin/v3/set-user-or-group-policy?policyName=p&userOrGroup=u&isGroup=false"
        );
    }

    #[test]
    fn tls_flag_selects_scheme() {
        let client = AdminClient::new(&StoreConfig {
            endpoint: "store.internal:9000".into(),
            access_key: "admin".into(),
            secret_key: "admin123456".into(),
            region: "eu-west-1".into(),
            ssl: true,
        })
        .unwrap();
        assert!(client
            .admin_url("remove-user", &[])
            .starts_with("https://store.internal:9000/"));
    }

    #[test]
    fn empty_endpoint_is_fatal() {
        let err = AdminClient::new(&StoreConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Connectivity(_)));
    }
}
