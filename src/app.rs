use std::sync::Arc;

use crate::{
    adapters::{
        inbound::http::router::{AppState, DEFAULT_MAX_UPLOAD_BYTES},
        outbound::storage::ConnectionStringConnector,
    },
    domain::value_objects::{ContainerName, DEFAULT_CONTAINER_NAME},
    ports::storage::ContainerConnector,
    services::GalleryServiceImpl,
};

/// Configuration for the application
#[derive(Clone)]
pub struct AppConfig {
    /// Storage connection string; absence only fails once a request needs storage
    pub connection_string: Option<String>,
    pub container: String,
    /// Where this server is reachable, used for self-hosted blob URLs
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            container: DEFAULT_CONTAINER_NAME.to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

// The connection string holds credentials
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "<redacted>"),
            )
            .field("container", &self.container)
            .field("public_base_url", &self.public_base_url)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

/// Application services container
pub struct AppServices {
    pub gallery_service: GalleryServiceImpl,
    pub max_upload_bytes: usize,
}

impl AppServices {
    /// Router state for the HTTP layer
    pub fn state(&self) -> AppState {
        AppState {
            gallery_service: Arc::new(self.gallery_service.clone()),
        }
    }
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
    connector: Option<Arc<dyn ContainerConnector>>,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            connector: None,
        }
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.config.connection_string = Some(connection_string.into());
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.config.container = container.into();
        self
    }

    pub fn with_public_base_url(mut self, public_base_url: impl Into<String>) -> Self {
        self.config.public_base_url = public_base_url.into();
        self
    }

    /// Use a prepared connector instead of the connection string
    pub fn with_connector(mut self, connector: Arc<dyn ContainerConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Build the application services
    ///
    /// Nothing touches storage here; the container is connected and
    /// provisioned by the first request.
    pub fn build(self) -> Result<AppServices, AppError> {
        let container = self
            .config
            .container
            .parse::<ContainerName>()
            .map_err(|e| AppError::Configuration {
                message: format!("Invalid container name '{}': {}", self.config.container, e),
            })?;

        let connector = match self.connector {
            Some(connector) => connector,
            None => Arc::new(ConnectionStringConnector::new(
                self.config.connection_string.clone(),
                self.config.public_base_url.clone(),
            )),
        };

        Ok(AppServices {
            gallery_service: GalleryServiceImpl::new(container, connector),
            max_upload_bytes: self.config.max_upload_bytes,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Create an in-memory application for testing and development
pub fn create_in_memory_app(public_base_url: &str) -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_connection_string("memory://")
        .with_public_base_url(public_base_url)
        .build()
}
