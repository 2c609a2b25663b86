use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, Method, Response, StatusCode};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

use super::{hmac_sha256, service_error, AdminError, ContainerAdmin};
use crate::domain::models::PublicAccess;

const API_VERSION: &str = "2021-08-06";

/// Account name of the local storage emulator
pub const AZURITE_ACCOUNT: &str = "devstoreaccount1";

/// Published shared key of the local storage emulator
pub const AZURITE_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

/// Azure Blob container management with Shared Key authorization
pub struct AzureContainerAdmin {
    http: Client,
    container_url: Url,
    account: String,
    key: Vec<u8>,
}

impl AzureContainerAdmin {
    /// `account_key` is the base64 key from the connection string
    pub fn new(
        http: Client,
        container_url: Url,
        account: impl Into<String>,
        account_key: &str,
    ) -> Result<Self, base64::DecodeError> {
        Ok(Self {
            http,
            container_url,
            account: account.into(),
            key: STANDARD.decode(account_key)?,
        })
    }

    async fn put_container(
        &self,
        operation: &'static str,
        query: &[(&str, &str)],
        ms_headers: &[(&str, &str)],
    ) -> Result<Response, AdminError> {
        let mut url = self.container_url.clone();
        url.query_pairs_mut().extend_pairs(query);

        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();

        let mut headers: BTreeMap<String, String> = ms_headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect();
        headers.insert("x-ms-date".to_string(), date);
        headers.insert("x-ms-version".to_string(), API_VERSION.to_string());

        let to_sign = string_to_sign(&Method::PUT, &headers, &url, &self.account);
        let signature = STANDARD.encode(hmac_sha256(&self.key, to_sign.as_bytes())?);

        let mut request = self
            .http
            .request(Method::PUT, url)
            .header(
                "Authorization",
                format!("SharedKey {}:{}", self.account, signature),
            )
            .header("Content-Length", "0");
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }

        request
            .send()
            .await
            .map_err(|source| AdminError::Request { operation, source })
    }
}

#[async_trait]
impl ContainerAdmin for AzureContainerAdmin {
    async fn create_container(&self) -> Result<bool, AdminError> {
        let operation = "Create container";
        let response = self
            .put_container(operation, &[("restype", "container")], &[])
            .await?;

        if response.status() == StatusCode::CREATED {
            debug!(url = %self.container_url, "Created container");
            return Ok(true);
        }

        let err = service_error(operation, response).await;
        if err.code() == Some("ContainerAlreadyExists") {
            return Ok(false);
        }
        Err(err)
    }

    async fn set_public_access(&self, access: PublicAccess) -> Result<(), AdminError> {
        let operation = "Set container ACL";
        let level = match access {
            PublicAccess::None => None,
            PublicAccess::Blob => Some("blob"),
            PublicAccess::Container => Some("container"),
        };
        let ms_headers: Vec<(&str, &str)> = level
            .map(|level| ("x-ms-blob-public-access", level))
            .into_iter()
            .collect();

        let response = self
            .put_container(
                operation,
                &[("restype", "container"), ("comp", "acl")],
                &ms_headers,
            )
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(service_error(operation, response).await)
    }
}

/// Shared Key string-to-sign for a request without body or standard headers
fn string_to_sign(
    method: &Method,
    ms_headers: &BTreeMap<String, String>,
    url: &Url,
    account: &str,
) -> String {
    // Verb, then eleven empty standard headers (Content-Encoding .. Range)
    let mut out = format!("{}\n{}", method.as_str(), "\n".repeat(11));

    for (name, value) in ms_headers {
        out.push_str(&format!("{}:{}\n", name, value.trim()));
    }

    out.push_str(&format!("/{}{}", account, url.path()));

    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in url.query_pairs() {
        params
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into_owned());
    }
    for (name, mut values) in params {
        values.sort();
        out.push_str(&format!("\n{}:{}", name, values.join(",")));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_sign_layout() {
        let url = Url::parse(
            "https://photos.blob.core.windows.net/gallery-images?restype=container&comp=acl",
        )
        .unwrap();
        let headers = BTreeMap::from([
            ("x-ms-blob-public-access".to_string(), "blob".to_string()),
            (
                "x-ms-date".to_string(),
                "Mon, 02 Jan 2023 10:00:00 GMT".to_string(),
            ),
            ("x-ms-version".to_string(), API_VERSION.to_string()),
        ]);

        let to_sign = string_to_sign(&Method::PUT, &headers, &url, "photos");

        assert_eq!(
            to_sign,
            "PUT\n\n\n\n\n\n\n\n\n\n\n\n\
             x-ms-blob-public-access:blob\n\
             x-ms-date:Mon, 02 Jan 2023 10:00:00 GMT\n\
             x-ms-version:2021-08-06\n\
             /photos/gallery-images\n\
             comp:acl\n\
             restype:container"
        );
    }

    #[test]
    fn test_emulator_resource_includes_account_path() {
        let url =
            Url::parse("http://127.0.0.1:10000/devstoreaccount1/gallery-images?restype=container")
                .unwrap();

        let to_sign = string_to_sign(&Method::PUT, &BTreeMap::new(), &url, AZURITE_ACCOUNT);
        assert!(to_sign.ends_with(
            "/devstoreaccount1/devstoreaccount1/gallery-images\nrestype:container"
        ));
    }

    #[test]
    fn test_rejects_key_that_is_not_base64() {
        let url = Url::parse("https://a.blob.core.windows.net/c").unwrap();
        assert!(AzureContainerAdmin::new(Client::new(), url, "a", "not base64!").is_err());
    }
}
