// Infrastructure error types
pub mod error;

// Storage implementations
pub mod admin;
pub mod connection_string;
pub mod connector;
pub mod object_store_container;

// Re-export key types
pub use admin::{AdminError, ContainerAdmin};
pub use connection_string::ConnectionString;
pub use connector::{ConnectionStringConnector, StaticConnector};
pub use error::StoreError;
pub use object_store_container::{ObjectStoreContainer, Provisioning};
