use percent_encoding::percent_decode_str;
use std::io;
use thiserror::Error as ThisError;

use crate::domain::{errors::GalleryError, value_objects::BlobName};

#[derive(ThisError, Debug)]
pub enum StoreError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Connection string is missing required setting '{0}'")]
    MissingSetting(&'static str),
}

/// Recover a blob name from an object_store path (last segment, decoded)
pub(crate) fn blob_name_from_path(path: &str) -> Option<BlobName> {
    let segment = path.rsplit('/').next()?;
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;
    BlobName::new(decoded.into_owned()).ok()
}

/// Map an object_store failure on one blob into the domain error
///
/// A missing object is reported under the name the caller asked for, not the
/// store path.
pub(crate) fn map_blob_error(
    name: &BlobName,
    action: &str,
    err: object_store::Error,
) -> GalleryError {
    match err {
        object_store::Error::NotFound { .. } => GalleryError::NotFound { name: name.clone() },
        _ => GalleryError::backend(format!("Failed to {} blob {}", action, name), &err),
    }
}

/// Turning the connection string into a client fails as a configuration
/// problem, except for local I/O on the storage root.
impl From<StoreError> for GalleryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(ref source) => {
                GalleryError::backend("Failed to prepare local storage root", source)
            }
            _ => GalleryError::Configuration {
                message: err.to_string(),
            },
        }
    }
}
