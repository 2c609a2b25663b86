use async_trait::async_trait;
use object_store::{
    aws::AmazonS3Builder, azure::MicrosoftAzureBuilder, local::LocalFileSystem,
    memory::InMemory, prefix::PrefixStore, ObjectStore,
};
use std::{sync::Arc, time::Duration};
use tracing::info;
use url::Url;

use super::{
    admin::{
        AzureContainerAdmin, S3BucketAdmin, S3Credentials, AZURITE_ACCOUNT, AZURITE_ACCOUNT_KEY,
    },
    connection_string::ConnectionString,
    error::StoreError,
    object_store_container::{ObjectStoreContainer, Provisioning},
};
use crate::{
    domain::{
        errors::{GalleryError, GalleryResult},
        value_objects::ContainerName,
    },
    ports::storage::{ContainerClient, ContainerConnector},
};

const AZURITE_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

const ADMIN_TIMEOUT: Duration = Duration::from_secs(30);

fn parse_url(raw: &str) -> Result<Url, StoreError> {
    Url::parse(raw)
        .map_err(|e| StoreError::InvalidConnectionString(format!("bad endpoint {}: {}", raw, e)))
}

fn azure_admin(
    http: reqwest::Client,
    container_uri: &str,
    account: &str,
    key: &str,
) -> Result<Provisioning, StoreError> {
    let admin = AzureContainerAdmin::new(http, parse_url(container_uri)?, account, key).map_err(
        |e| StoreError::InvalidConnectionString(format!("AccountKey is not base64: {}", e)),
    )?;
    Ok(Provisioning::Remote(Arc::new(admin)))
}

/// Connector that reads the storage connection string from configuration
///
/// `public_base_url` is where this server is reachable; backends without
/// their own HTTP endpoint (memory, local disk) serve blobs under
/// `<public_base_url>/blobs`.
#[derive(Clone)]
pub struct ConnectionStringConnector {
    connection_string: Option<String>,
    public_base_url: String,
}

impl ConnectionStringConnector {
    pub fn new(connection_string: Option<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            connection_string,
            public_base_url: public_base_url.into(),
        }
    }

    fn self_hosted_uri(&self) -> String {
        format!("{}/blobs", self.public_base_url.trim_end_matches('/'))
    }

    async fn build(
        &self,
        conn: ConnectionString,
        container: &ContainerName,
    ) -> Result<ObjectStoreContainer, StoreError> {
        let container_name = container.as_str();
        let http = || reqwest::Client::builder().timeout(ADMIN_TIMEOUT).build();

        let (store, uri, provisioning): (Arc<dyn ObjectStore>, String, Provisioning) = match conn {
            ConnectionString::InMemory => (
                Arc::new(InMemory::new()),
                self.self_hosted_uri(),
                Provisioning::Implicit,
            ),
            ConnectionString::LocalFileSystem { root } => {
                tokio::fs::create_dir_all(&root).await?;
                let fs = LocalFileSystem::new_with_prefix(&root)?;
                (
                    Arc::new(PrefixStore::new(fs, container_name)),
                    self.self_hosted_uri(),
                    Provisioning::Directory(root.join(container_name)),
                )
            }
            ConnectionString::AzureEmulator => {
                let store = MicrosoftAzureBuilder::new()
                    .with_use_emulator(true)
                    .with_container_name(container_name)
                    .build()?;
                let uri = format!("{}/{}", AZURITE_BLOB_ENDPOINT, container_name);
                let provisioning = azure_admin(http()?, &uri, AZURITE_ACCOUNT, AZURITE_ACCOUNT_KEY)?;
                (Arc::new(store), uri, provisioning)
            }
            ConnectionString::Azure {
                account,
                access_key,
                protocol,
                endpoint_suffix,
                blob_endpoint,
            } => {
                let endpoint = blob_endpoint.unwrap_or_else(|| {
                    format!("{}://{}.blob.{}", protocol, account, endpoint_suffix)
                });
                let store = MicrosoftAzureBuilder::new()
                    .with_account(&account)
                    .with_access_key(&access_key)
                    .with_container_name(container_name)
                    .with_endpoint(endpoint.clone())
                    .with_allow_http(endpoint.starts_with("http://"))
                    .build()?;
                let uri = format!("{}/{}", endpoint, container_name);
                let provisioning = azure_admin(http()?, &uri, &account, &access_key)?;
                (Arc::new(store), uri, provisioning)
            }
            ConnectionString::S3 {
                region,
                access_key_id,
                secret_access_key,
                endpoint,
            } => {
                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(container_name)
                    .with_region(&region);

                if let Some(access_key_id) = &access_key_id {
                    builder = builder.with_access_key_id(access_key_id);
                }

                if let Some(secret_access_key) = &secret_access_key {
                    builder = builder.with_secret_access_key(secret_access_key);
                }

                let uri = match &endpoint {
                    Some(endpoint) => {
                        builder = builder
                            .with_endpoint(endpoint)
                            .with_allow_http(endpoint.starts_with("http://"));
                        format!("{}/{}", endpoint, container_name)
                    }
                    None => format!("https://{}.s3.{}.amazonaws.com", container_name, region),
                };

                let credentials = match (access_key_id, secret_access_key) {
                    (Some(access_key_id), Some(secret_access_key)) => Some(S3Credentials {
                        access_key_id,
                        secret_access_key,
                    }),
                    _ => None,
                };
                let admin = S3BucketAdmin::new(
                    http()?,
                    parse_url(&uri)?,
                    container_name,
                    region,
                    credentials,
                );

                (
                    Arc::new(builder.build()?),
                    uri,
                    Provisioning::Remote(Arc::new(admin)),
                )
            }
        };

        Ok(ObjectStoreContainer::new(store, uri, provisioning))
    }
}

#[async_trait]
impl ContainerConnector for ConnectionStringConnector {
    async fn connect(&self, container: &ContainerName) -> GalleryResult<Arc<dyn ContainerClient>> {
        let raw = self
            .connection_string
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                GalleryError::configuration(
                    "No storage connection string configured (set STORAGE_CONNECTION_STRING)",
                )
            })?;

        let conn = ConnectionString::parse(raw)?;
        info!(backend = conn.backend(), container = %container, "Connecting to storage");

        let client = self.build(conn, container).await?;
        Ok(Arc::new(client))
    }
}

/// Connector handing out a client that was built up front
pub struct StaticConnector {
    client: Arc<dyn ContainerClient>,
}

impl StaticConnector {
    pub fn new(client: Arc<dyn ContainerClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContainerConnector for StaticConnector {
    async fn connect(&self, _container: &ContainerName) -> GalleryResult<Arc<dyn ContainerClient>> {
        Ok(Arc::clone(&self.client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_connection_string_is_configuration_error() {
        let connector = ConnectionStringConnector::new(None, "http://localhost:3000");
        let result = connector.connect(&ContainerName::default()).await;
        assert!(matches!(result, Err(GalleryError::Configuration { .. })));

        let blank = ConnectionStringConnector::new(Some("  ".to_string()), "http://localhost:3000");
        let result = blank.connect(&ContainerName::default()).await;
        assert!(matches!(result, Err(GalleryError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_malformed_connection_string_is_configuration_error() {
        let connector =
            ConnectionStringConnector::new(Some("AccountName=x".to_string()), "http://localhost");
        let result = connector.connect(&ContainerName::default()).await;
        assert!(matches!(result, Err(GalleryError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_memory_connection_uses_public_base_url() {
        let connector =
            ConnectionStringConnector::new(Some("memory://".to_string()), "http://example.test/");
        let client = connector.connect(&ContainerName::default()).await.unwrap();
        assert_eq!(client.uri(), "http://example.test/blobs");
    }

    #[tokio::test]
    async fn test_azure_uri_from_account() {
        let connector = ConnectionStringConnector::new(
            Some("AccountName=photos;AccountKey=a2V5".to_string()),
            "http://localhost:3000",
        );
        let client = connector.connect(&ContainerName::default()).await.unwrap();
        assert_eq!(
            client.uri(),
            "https://photos.blob.core.windows.net/gallery-images"
        );
    }

    #[tokio::test]
    async fn test_unusable_storage_root_is_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        let conn = format!("file://{}", file.join("root").display());
        let connector = ConnectionStringConnector::new(Some(conn), "http://localhost:3000");

        match connector.connect(&ContainerName::default()).await {
            Err(GalleryError::Backend { message, causes }) => {
                assert_eq!(message, "Failed to prepare local storage root");
                assert!(!causes.is_empty());
            }
            Err(other) => panic!("Expected Backend, got {:?}", other),
            Ok(_) => panic!("Expected Backend, got a client"),
        }
    }

    #[tokio::test]
    async fn test_azure_key_must_be_base64() {
        let connector = ConnectionStringConnector::new(
            Some("AccountName=photos;AccountKey=!!!".to_string()),
            "http://localhost:3000",
        );
        let result = connector.connect(&ContainerName::default()).await;
        assert!(matches!(result, Err(GalleryError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_local_connection_creates_container_directory() {
        let root = tempfile::tempdir().unwrap();
        let conn = format!("file://{}", root.path().display());
        let connector = ConnectionStringConnector::new(Some(conn), "http://localhost:3000");

        let client = connector.connect(&ContainerName::default()).await.unwrap();
        assert!(client.create_if_not_exists().await.unwrap());
        assert!(root.path().join("gallery-images").is_dir());
    }
}
