use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::BlobName;

/// Kind of a stored object
///
/// Only block blobs are whole-file objects; append and page blobs never show
/// up in the gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobKind {
    Block,
    Append,
    Page,
}

/// Anonymous read access level of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicAccess {
    /// Private container
    #[default]
    None,
    /// Blobs are readable anonymously, the listing is not
    Blob,
    /// Blobs and the listing are readable anonymously
    Container,
}

impl PublicAccess {
    pub fn allows_blob_read(self) -> bool {
        matches!(self, PublicAccess::Blob | PublicAccess::Container)
    }
}

/// Read-only projection of a blob as the gallery shows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobDescriptor {
    pub name: BlobName,
    pub url: String,
}

/// Blob bytes served back for self-hosted backends
#[derive(Debug, Clone)]
pub struct BlobContent {
    pub name: BlobName,
    pub data: Bytes,
    pub content_type: &'static str,
}

/// Guess a content type from the blob extension
pub fn content_type_for(name: &BlobName) -> &'static str {
    let ext = name
        .extension()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_guess() {
        let jpg = BlobName::new("1_abc.JPG".to_string()).unwrap();
        assert_eq!(content_type_for(&jpg), "image/jpeg");

        let bin = BlobName::new("1_abc".to_string()).unwrap();
        assert_eq!(content_type_for(&bin), "application/octet-stream");
    }

    #[test]
    fn test_public_access() {
        assert!(!PublicAccess::None.allows_blob_read());
        assert!(PublicAccess::Blob.allows_blob_read());
        assert!(PublicAccess::Container.allows_blob_read());
    }
}
