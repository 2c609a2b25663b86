mod container_client;

pub use container_client::{BlobItem, ContainerClient, ContainerConnector, ContentStream};
