pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - core business entities and value objects
pub use domain::{
    // Models
    BlobContent,
    BlobDescriptor,
    BlobKind,
    // Value objects
    BlobName,
    ContainerName,
    // Errors
    GalleryError,
    GalleryResult,
    PublicAccess,
    ValidationError,
    DEFAULT_CONTAINER_NAME,
};

// Port types - interfaces for external systems
pub use ports::{BlobItem, ContainerClient, ContainerConnector, ContentStream, GalleryService};

// Service implementations - business logic
pub use services::{GalleryServiceBuilder, GalleryServiceImpl};

// Application factory and configuration
pub use app::{create_in_memory_app, AppBuilder, AppConfig, AppError, AppServices};

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{
    ConnectionString, ConnectionStringConnector, ObjectStoreContainer, StaticConnector,
};
