use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{delete_all, delete_blob, get_blob, index, list_blobs, upload};
use crate::ports::services::GalleryService;

/// Upload body limit when none is configured
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub gallery_service: Arc<dyn GalleryService>,
}

/// Create the main application router with all endpoints
pub fn create_router(state: AppState) -> Router {
    create_router_with_limit(state, DEFAULT_MAX_UPLOAD_BYTES)
}

/// Create the router with an explicit limit on upload request bodies
pub fn create_router_with_limit(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        // Gallery pages and form actions
        .route("/", get(index))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/delete", post(delete_blob))
        .route("/delete-all", post(delete_all))
        // Machine-readable listing
        .route("/api/blobs", get(list_blobs))
        // Blob bytes for self-hosted backends
        .route("/blobs/{name}", get(get_blob))
        .layer(TraceLayer::new_for_http())
        // Add state for dependency injection
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::outbound::storage::{ObjectStoreContainer, StaticConnector},
        services::GalleryServiceImpl,
        ContainerName,
    };
    use axum_test::TestServer;

    fn create_test_app_state() -> AppState {
        let client = Arc::new(ObjectStoreContainer::in_memory("http://localhost/blobs"));
        let service = GalleryServiceImpl::new(
            ContainerName::default(),
            Arc::new(StaticConnector::new(client)),
        );

        AppState {
            gallery_service: Arc::new(service),
        }
    }

    #[tokio::test]
    async fn test_index_renders_empty_gallery() {
        let server = TestServer::new(create_router(create_test_app_state())).unwrap();

        let response = server.get("/").await;
        response.assert_status_ok();
        assert!(response.text().contains("No images yet."));
    }

    #[tokio::test]
    async fn test_unknown_blob_is_404() {
        let server = TestServer::new(create_router(create_test_app_state())).unwrap();

        let response = server.get("/blobs/missing.jpg").await;
        response.assert_status_not_found();
        assert!(response.text().contains("Blob not found: missing.jpg"));
    }
}
