use async_trait::async_trait;
use blob_gallery::{
    create_in_memory_app, AppBuilder, BlobItem, BlobKind, BlobName, ContainerClient,
    ContainerName, ContentStream, GalleryError, GalleryResult, GalleryService, GalleryServiceImpl,
    ObjectStoreContainer, PublicAccess, StaticConnector,
};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

const CONTAINER_URI: &str = "http://localhost:3000/blobs";

/// In-memory container that counts setup calls and can be told to misbehave
struct InstrumentedClient {
    inner: ObjectStoreContainer,
    creates: AtomicUsize,
    policy_changes: AtomicUsize,
    failing_delete: Option<String>,
    extra_items: Vec<BlobItem>,
}

impl InstrumentedClient {
    fn new() -> Self {
        Self {
            inner: ObjectStoreContainer::in_memory(CONTAINER_URI),
            creates: AtomicUsize::new(0),
            policy_changes: AtomicUsize::new(0),
            failing_delete: None,
            extra_items: Vec::new(),
        }
    }

    fn failing_delete_of(mut self, name: &str) -> Self {
        self.failing_delete = Some(name.to_string());
        self
    }

    fn with_listed_item(mut self, name: &str, kind: BlobKind) -> Self {
        self.extra_items.push(BlobItem {
            name: blob_name(name),
            kind,
        });
        self
    }
}

#[async_trait]
impl ContainerClient for InstrumentedClient {
    fn uri(&self) -> &str {
        self.inner.uri()
    }

    async fn create_if_not_exists(&self) -> GalleryResult<bool> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        // Widen the window for concurrent first callers
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.inner.create_if_not_exists().await
    }

    async fn set_access_policy(&self, access: PublicAccess) -> GalleryResult<()> {
        self.policy_changes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_access_policy(access).await
    }

    async fn access_policy(&self) -> GalleryResult<PublicAccess> {
        self.inner.access_policy().await
    }

    async fn list_blobs(&self) -> GalleryResult<Vec<BlobItem>> {
        let mut items = self.inner.list_blobs().await?;
        items.extend(self.extra_items.iter().cloned());
        Ok(items)
    }

    async fn upload_blob<'a>(
        &self,
        name: &BlobName,
        content: ContentStream<'a>,
    ) -> GalleryResult<u64> {
        self.inner.upload_blob(name, content).await
    }

    async fn delete_blob(&self, name: &BlobName) -> GalleryResult<()> {
        if self.failing_delete.as_deref() == Some(name.as_str()) {
            return Err(GalleryError::backend(
                format!("Failed to delete blob '{}'", name),
                &std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
            ));
        }
        self.inner.delete_blob(name).await
    }

    async fn get_blob(&self, name: &BlobName) -> GalleryResult<Bytes> {
        self.inner.get_blob(name).await
    }
}

fn blob_name(name: &str) -> BlobName {
    BlobName::new(name.to_string()).unwrap()
}

fn content(data: &[u8]) -> ContentStream<'static> {
    stream::iter(vec![Ok(Bytes::copy_from_slice(data))]).boxed()
}

fn service_over(client: Arc<InstrumentedClient>) -> GalleryServiceImpl {
    GalleryServiceImpl::new(
        ContainerName::default(),
        Arc::new(StaticConnector::new(client)),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ensure_ready_sets_up_once() {
    let client = Arc::new(InstrumentedClient::new());
    let service = service_over(client.clone());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.ensure_ready().await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    service.ensure_ready().await.unwrap();
    service.list().await.unwrap();

    assert_eq!(client.creates.load(Ordering::SeqCst), 1);
    assert_eq!(client.policy_changes.load(Ordering::SeqCst), 1);
    assert_eq!(
        client.access_policy().await.unwrap(),
        PublicAccess::Blob
    );
}

#[tokio::test]
async fn test_upload_keeps_extension_and_content() {
    let services = create_in_memory_app("http://localhost:3000").unwrap();
    let service = &services.gallery_service;

    for (file, data) in [
        ("beach.JPG", &b"\xFF\xD8\xFF\xE0"[..]),
        ("diagram.png", &b"\x89PNG\r\n"[..]),
        ("archive.tar.gz", &b"\x1F\x8B"[..]),
    ] {
        let uploaded = service.upload(file, content(data)).await.unwrap();
        let extension = &file[file.rfind('.').unwrap()..];
        assert!(uploaded.name.as_str().ends_with(extension));

        let listed = service.list().await.unwrap();
        assert!(listed.contains(&uploaded));

        let fetched = service.open_blob(&uploaded.name).await.unwrap();
        assert_eq!(fetched.data.as_ref(), data);
    }
}

#[tokio::test]
async fn test_upload_without_extension() {
    let services = create_in_memory_app("http://localhost:3000").unwrap();

    let uploaded = services
        .gallery_service
        .upload("README", content(b"plain"))
        .await
        .unwrap();

    assert!(!uploaded.name.as_str().contains('.'));
    assert!(uploaded.url.ends_with(uploaded.name.as_str()));
}

#[tokio::test]
async fn test_delete_one_removes_from_list() {
    let services = create_in_memory_app("http://localhost:3000").unwrap();
    let service = &services.gallery_service;

    let keep = service.upload("keep.png", content(b"k")).await.unwrap();
    let drop = service.upload("drop.png", content(b"d")).await.unwrap();

    service.delete_one(&drop.name).await.unwrap();

    let listed = service.list().await.unwrap();
    assert_eq!(listed, vec![keep]);
}

#[tokio::test]
async fn test_delete_unknown_blob_is_not_found() {
    let services = create_in_memory_app("http://localhost:3000").unwrap();

    let err = services
        .gallery_service
        .delete_one(&blob_name("638000000000000000_never.jpg"))
        .await
        .unwrap_err();

    assert!(matches!(err, GalleryError::NotFound { .. }));
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn test_delete_all_stops_at_first_failure() {
    let client = Arc::new(InstrumentedClient::new().failing_delete_of("b"));
    for name in ["a", "b", "c"] {
        client
            .upload_blob(&blob_name(name), content(name.as_bytes()))
            .await
            .unwrap();
    }
    let service = service_over(client.clone());

    let err = service.delete_all().await.unwrap_err();
    assert!(matches!(err, GalleryError::Backend { .. }));

    let remaining: Vec<String> = service
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|blob| blob.name.to_string())
        .collect();
    assert_eq!(remaining, vec!["b", "c"]);
}

#[tokio::test]
async fn test_only_block_blobs_are_listed() {
    let client = Arc::new(
        InstrumentedClient::new()
            .with_listed_item("journal.log", BlobKind::Append)
            .with_listed_item("disk.vhd", BlobKind::Page),
    );
    let service = service_over(client);

    let uploaded = service.upload("cat.gif", content(b"GIF89a")).await.unwrap();

    assert_eq!(service.list().await.unwrap(), vec![uploaded]);
    assert_eq!(service.delete_all().await.unwrap(), 1);
}

#[tokio::test]
async fn test_photo_round_trip() {
    let services = create_in_memory_app("http://localhost:3000").unwrap();
    let service = &services.gallery_service;

    service.ensure_ready().await.unwrap();
    service
        .upload("photo.jpg", content(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]))
        .await
        .unwrap();

    let listed = service.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].name.as_str().ends_with(".jpg"));
    assert!(listed[0].url.starts_with(CONTAINER_URI));

    service.delete_one(&listed[0].name).await.unwrap();
    assert!(service.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_connection_string_is_configuration_error() {
    let services = AppBuilder::new().build().unwrap();

    let err = services.gallery_service.list().await.unwrap_err();
    assert!(matches!(err, GalleryError::Configuration { .. }));

    // Still failing on the next request, nothing was cached
    let err = services.gallery_service.ensure_ready().await.unwrap_err();
    assert_eq!(err.kind(), "configuration_error");
}

#[tokio::test]
async fn test_malformed_connection_string_is_configuration_error() {
    let services = AppBuilder::new()
        .with_connection_string("AccountName=photos")
        .build()
        .unwrap();

    let err = services.gallery_service.ensure_ready().await.unwrap_err();
    assert!(matches!(err, GalleryError::Configuration { .. }));
}

#[tokio::test]
async fn test_local_directory_backend_persists() {
    let dir = tempfile::tempdir().unwrap();
    let connection_string = format!("file://{}", dir.path().display());

    let uploaded = {
        let services = AppBuilder::new()
            .with_connection_string(connection_string.clone())
            .build()
            .unwrap();
        services
            .gallery_service
            .upload("saved.bmp", content(b"BM"))
            .await
            .unwrap()
    };

    let services = AppBuilder::new()
        .with_connection_string(connection_string)
        .build()
        .unwrap();
    let listed = services.gallery_service.list().await.unwrap();

    assert_eq!(listed, vec![uploaded]);
}

#[tokio::test]
async fn test_builder_uses_supplied_connector() {
    let client = Arc::new(InstrumentedClient::new());
    let services = AppBuilder::new()
        .with_connection_string("AccountName=never-used")
        .with_container("holiday-photos")
        .with_connector(Arc::new(StaticConnector::new(client.clone())))
        .build()
        .unwrap();

    assert_eq!(services.gallery_service.container().as_str(), "holiday-photos");

    services.gallery_service.ensure_ready().await.unwrap();
    assert_eq!(client.creates.load(Ordering::SeqCst), 1);
    assert_eq!(client.policy_changes.load(Ordering::SeqCst), 1);
}
