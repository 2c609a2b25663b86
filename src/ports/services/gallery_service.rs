use async_trait::async_trait;

use crate::{
    domain::{
        errors::GalleryResult,
        models::{BlobContent, BlobDescriptor},
        value_objects::BlobName,
    },
    ports::storage::ContentStream,
};

/// Port for the gallery operations the web layer drives
/// This trait defines the business logic over a single container
#[async_trait]
pub trait GalleryService: Send + Sync + 'static {
    /// Perform one-time container setup; later calls are no-ops
    async fn ensure_ready(&self) -> GalleryResult<()>;

    /// Describe every block blob in the container
    async fn list(&self) -> GalleryResult<Vec<BlobDescriptor>>;

    /// Store content under a freshly generated name
    async fn upload<'a>(
        &self,
        original_filename: &str,
        content: ContentStream<'a>,
    ) -> GalleryResult<BlobDescriptor>;

    /// Delete one blob by bare name
    async fn delete_one(&self, name: &BlobName) -> GalleryResult<()>;

    /// Delete every block blob, stopping at the first failure
    async fn delete_all(&self) -> GalleryResult<usize>;

    /// Read a blob for anonymous serving
    async fn open_blob(&self, name: &BlobName) -> GalleryResult<BlobContent>;
}
