use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::domain::{
    errors::GalleryResult,
    models::{BlobKind, PublicAccess},
    value_objects::{BlobName, ContainerName},
};

/// Byte stream handed to [`ContainerClient::upload_blob`]
pub type ContentStream<'a> = BoxStream<'a, std::io::Result<Bytes>>;

/// Port for the operations the gallery needs on one storage container
/// This abstracts the actual storage backend (Azure, S3, local disk, ...)
#[async_trait]
pub trait ContainerClient: Send + Sync + 'static {
    /// Base URI that blob names are appended to
    fn uri(&self) -> &str;

    /// Create the container if it does not exist yet; returns true if created
    async fn create_if_not_exists(&self) -> GalleryResult<bool>;

    /// Set the anonymous read access level of the container
    async fn set_access_policy(&self, access: PublicAccess) -> GalleryResult<()>;

    /// Current anonymous read access level of the container
    async fn access_policy(&self) -> GalleryResult<PublicAccess>;

    /// Enumerate all top-level blobs of the container
    async fn list_blobs(&self) -> GalleryResult<Vec<BlobItem>>;

    /// Stream content into a new blob; returns the number of bytes written
    async fn upload_blob<'a>(
        &self,
        name: &BlobName,
        content: ContentStream<'a>,
    ) -> GalleryResult<u64>;

    /// Delete a blob; a missing blob is reported as `NotFound`
    async fn delete_blob(&self, name: &BlobName) -> GalleryResult<()>;

    /// Read a whole blob
    async fn get_blob(&self, name: &BlobName) -> GalleryResult<Bytes>;
}

/// Port that turns process configuration into a connected container client
#[async_trait]
pub trait ContainerConnector: Send + Sync + 'static {
    /// Fails with `Configuration` when the credential is absent or malformed
    async fn connect(&self, container: &ContainerName) -> GalleryResult<Arc<dyn ContainerClient>>;
}

/// One enumerated blob
#[derive(Debug, Clone)]
pub struct BlobItem {
    pub name: BlobName,
    pub kind: BlobKind,
}
