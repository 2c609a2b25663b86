use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::{
    domain::{
        errors::{GalleryError, GalleryResult},
        models::{
            content_type_for, describe, generate_blob_name, BlobContent, BlobDescriptor, BlobKind,
            PublicAccess,
        },
        value_objects::{BlobName, ContainerName},
    },
    ports::{
        services::GalleryService,
        storage::{ContainerClient, ContainerConnector, ContentStream},
    },
};

/// Implementation of GalleryService over a single container
///
/// Cloning is cheap and every clone shares the same one-time setup, so the
/// web layer can hand a fresh clone to each request.
#[derive(Clone)]
pub struct GalleryServiceImpl {
    container: ContainerName,
    connector: Arc<dyn ContainerConnector>,
    ready: Arc<OnceCell<Arc<dyn ContainerClient>>>,
}

impl GalleryServiceImpl {
    /// Create a new GalleryServiceImpl instance
    pub fn new(container: ContainerName, connector: Arc<dyn ContainerConnector>) -> Self {
        Self {
            container,
            connector,
            ready: Arc::new(OnceCell::new()),
        }
    }

    pub fn container(&self) -> &ContainerName {
        &self.container
    }

    /// Container client, connecting and provisioning on first use
    ///
    /// Concurrent first callers wait on the same initialization; a failed
    /// attempt leaves the cell empty so the next request tries again.
    async fn client(&self) -> GalleryResult<&Arc<dyn ContainerClient>> {
        self.ready
            .get_or_try_init(|| async {
                let client = self.connector.connect(&self.container).await?;
                let created = client.create_if_not_exists().await?;
                client.set_access_policy(PublicAccess::Blob).await?;

                info!(
                    container = %self.container,
                    uri = client.uri(),
                    created,
                    "Container ready"
                );
                Ok::<_, GalleryError>(client)
            })
            .await
    }

    /// Names of all block blobs, in backend order
    async fn block_blobs(client: &Arc<dyn ContainerClient>) -> GalleryResult<Vec<BlobName>> {
        let items = client.list_blobs().await?;
        let total = items.len();

        let names: Vec<BlobName> = items
            .into_iter()
            .filter(|item| item.kind == BlobKind::Block)
            .map(|item| item.name)
            .collect();

        debug!(total, block = names.len(), "Enumerated blobs");
        Ok(names)
    }
}

#[async_trait]
impl GalleryService for GalleryServiceImpl {
    async fn ensure_ready(&self) -> GalleryResult<()> {
        self.client().await.map(|_| ())
    }

    async fn list(&self) -> GalleryResult<Vec<BlobDescriptor>> {
        let client = self.client().await?;
        let names = Self::block_blobs(client).await?;

        Ok(names
            .into_iter()
            .map(|name| describe(client.uri(), name))
            .collect())
    }

    async fn upload<'a>(
        &self,
        original_filename: &str,
        content: ContentStream<'a>,
    ) -> GalleryResult<BlobDescriptor> {
        let client = self.client().await?;
        let name = generate_blob_name(original_filename, chrono::Utc::now())?;

        let size = client.upload_blob(&name, content).await?;
        info!(blob = %name, original_filename, size, "Uploaded blob");

        Ok(describe(client.uri(), name))
    }

    async fn delete_one(&self, name: &BlobName) -> GalleryResult<()> {
        let client = self.client().await?;
        client.delete_blob(name).await?;

        info!(blob = %name, "Deleted blob");
        Ok(())
    }

    async fn delete_all(&self) -> GalleryResult<usize> {
        let client = self.client().await?;
        let names = Self::block_blobs(client).await?;
        let total = names.len();

        // Sequential and fail-fast: blobs before a failure stay deleted.
        for (deleted, name) in names.iter().enumerate() {
            if let Err(e) = client.delete_blob(name).await {
                warn!(blob = %name, deleted, total, error = %e, "Delete all stopped");
                return Err(e);
            }
        }

        info!(deleted = total, "Deleted all blobs");
        Ok(total)
    }

    async fn open_blob(&self, name: &BlobName) -> GalleryResult<BlobContent> {
        let client = self.client().await?;

        if !client.access_policy().await?.allows_blob_read() {
            return Err(GalleryError::AccessDenied { name: name.clone() });
        }

        let data = client.get_blob(name).await?;
        Ok(BlobContent {
            name: name.clone(),
            data,
            content_type: content_type_for(name),
        })
    }
}

/// Builder for GalleryServiceImpl
pub struct GalleryServiceBuilder {
    container: Option<ContainerName>,
    connector: Option<Arc<dyn ContainerConnector>>,
}

impl GalleryServiceBuilder {
    pub fn new() -> Self {
        Self {
            container: None,
            connector: None,
        }
    }

    pub fn container(mut self, container: ContainerName) -> Self {
        self.container = Some(container);
        self
    }

    pub fn connector(mut self, connector: Arc<dyn ContainerConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn build(self) -> Result<GalleryServiceImpl, &'static str> {
        let connector = self.connector.ok_or("Connector is required")?;

        Ok(GalleryServiceImpl::new(
            self.container.unwrap_or_default(),
            connector,
        ))
    }
}

impl Default for GalleryServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
