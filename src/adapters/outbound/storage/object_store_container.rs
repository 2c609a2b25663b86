use async_trait::async_trait;
use bytes::Bytes;
use object_store::{buffered::BufWriter, memory::InMemory, path::Path as ObjectPath, ObjectStore};
use std::{path::PathBuf, sync::Arc};
use tokio::{io::AsyncWriteExt, sync::RwLock};
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

use super::{
    admin::ContainerAdmin,
    error::{blob_name_from_path, map_blob_error},
};
use crate::{
    domain::{
        errors::{GalleryError, GalleryResult},
        models::{BlobKind, PublicAccess},
        value_objects::BlobName,
    },
    ports::storage::{BlobItem, ContainerClient, ContentStream},
};

/// How the container itself comes into existence
#[derive(Clone)]
pub enum Provisioning {
    /// The store has no container concept (in-memory)
    Implicit,
    /// A directory on local disk
    Directory(PathBuf),
    /// A remote container created and opened up through its service API
    Remote(Arc<dyn ContainerAdmin>),
}

/// Adapter that implements our ContainerClient trait using Apache object_store
///
/// object_store only knows a single flat key space per store, so every blob is
/// reported as a block blob and nested keys are left out of listings.
pub struct ObjectStoreContainer {
    inner: Arc<dyn ObjectStore>,
    uri: String,
    provisioning: Provisioning,
    access: RwLock<PublicAccess>,
}

impl ObjectStoreContainer {
    pub fn new(store: Arc<dyn ObjectStore>, uri: String, provisioning: Provisioning) -> Self {
        Self {
            inner: store,
            uri,
            provisioning,
            access: RwLock::new(PublicAccess::None),
        }
    }

    /// In-memory container whose blobs are served under `uri`
    pub fn in_memory(uri: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemory::new()), uri.into(), Provisioning::Implicit)
    }

    fn path(name: &BlobName) -> ObjectPath {
        ObjectPath::from(name.as_str())
    }
}

#[async_trait]
impl ContainerClient for ObjectStoreContainer {
    fn uri(&self) -> &str {
        &self.uri
    }

    async fn create_if_not_exists(&self) -> GalleryResult<bool> {
        match &self.provisioning {
            Provisioning::Implicit => Ok(false),
            Provisioning::Directory(dir) => {
                if tokio::fs::try_exists(dir).await.unwrap_or(false) {
                    return Ok(false);
                }
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    GalleryError::backend(
                        format!("Failed to create container directory {}", dir.display()),
                        &e,
                    )
                })?;
                Ok(true)
            }
            Provisioning::Remote(admin) => {
                let created = admin.create_container().await.map_err(|e| {
                    GalleryError::backend(format!("Failed to create container {}", self.uri), &e)
                })?;
                if created {
                    info!(uri = %self.uri, "Created container");
                }
                Ok(created)
            }
        }
    }

    async fn set_access_policy(&self, access: PublicAccess) -> GalleryResult<()> {
        if let Provisioning::Remote(admin) = &self.provisioning {
            admin.set_public_access(access).await.map_err(|e| {
                GalleryError::backend(
                    format!("Failed to set access policy on container {}", self.uri),
                    &e,
                )
            })?;
        }
        *self.access.write().await = access;
        Ok(())
    }

    async fn access_policy(&self) -> GalleryResult<PublicAccess> {
        Ok(*self.access.read().await)
    }

    async fn list_blobs(&self) -> GalleryResult<Vec<BlobItem>> {
        let listing = self
            .inner
            .list_with_delimiter(None)
            .await
            .map_err(|e| GalleryError::backend("Failed to list blobs", &e))?;

        debug!(
            objects = listing.objects.len(),
            prefixes = listing.common_prefixes.len(),
            "Listed container"
        );

        let mut blobs = Vec::with_capacity(listing.objects.len());
        for meta in listing.objects {
            let Some(name) = blob_name_from_path(meta.location.as_ref()) else {
                warn!(location = %meta.location, "Skipping object with unusable name");
                continue;
            };

            blobs.push(BlobItem {
                name,
                kind: BlobKind::Block,
            });
        }

        Ok(blobs)
    }

    async fn upload_blob<'a>(
        &self,
        name: &BlobName,
        content: ContentStream<'a>,
    ) -> GalleryResult<u64> {
        let mut reader = StreamReader::new(content);
        let mut writer = BufWriter::new(Arc::clone(&self.inner), Self::path(name));

        let written = match tokio::io::copy(&mut reader, &mut writer).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    warn!(blob = %name, error = %abort_err, "Failed to abort partial upload");
                }
                return Err(GalleryError::backend(
                    format!("Failed to upload blob {}", name),
                    &e,
                ));
            }
        };

        writer
            .shutdown()
            .await
            .map_err(|e| GalleryError::backend(format!("Failed to upload blob {}", name), &e))?;

        Ok(written)
    }

    async fn delete_blob(&self, name: &BlobName) -> GalleryResult<()> {
        let path = Self::path(name);

        // Not every store reports a missing key on delete, so check first.
        self.inner
            .head(&path)
            .await
            .map_err(|e| map_blob_error(name, "delete", e))?;

        self.inner
            .delete(&path)
            .await
            .map_err(|e| map_blob_error(name, "delete", e))
    }

    async fn get_blob(&self, name: &BlobName) -> GalleryResult<Bytes> {
        let result = self
            .inner
            .get(&Self::path(name))
            .await
            .map_err(|e| map_blob_error(name, "read", e))?;

        result
            .bytes()
            .await
            .map_err(|e| map_blob_error(name, "read", e))
    }
}
