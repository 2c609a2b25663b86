use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::{errors::GalleryError, models::BlobDescriptor};

/// DTO for one gallery entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobDescriptorDto {
    pub name: String,
    pub url: String,
}

/// DTO for the blob listing response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListBlobsResponseDto {
    pub blobs: Vec<BlobDescriptorDto>,
    pub total_count: usize,
}

/// Form body of the delete action
///
/// `name` is whatever the gallery page posted: normally the blob URL, but a
/// bare blob name is accepted as well.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteBlobForm {
    pub name: String,
}

/// DTO for error responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub error: String,
    pub message: String,
    pub trace: Vec<String>,
    pub details: Option<HashMap<String, serde_json::Value>>,
    pub timestamp: DateTime<Utc>,
}

impl From<BlobDescriptor> for BlobDescriptorDto {
    fn from(descriptor: BlobDescriptor) -> Self {
        BlobDescriptorDto {
            name: descriptor.name.as_str().to_string(),
            url: descriptor.url,
        }
    }
}

impl From<Vec<BlobDescriptor>> for ListBlobsResponseDto {
    fn from(descriptors: Vec<BlobDescriptor>) -> Self {
        let blobs: Vec<BlobDescriptorDto> = descriptors.into_iter().map(Into::into).collect();
        let total_count = blobs.len();
        ListBlobsResponseDto { blobs, total_count }
    }
}

impl ErrorResponseDto {
    pub fn from_gallery_error(error: &GalleryError) -> Self {
        let mut details = HashMap::new();

        match error {
            GalleryError::NotFound { name } | GalleryError::AccessDenied { name } => {
                details.insert(
                    "name".to_string(),
                    serde_json::Value::String(name.as_str().to_string()),
                );
            }
            _ => {}
        }

        ErrorResponseDto {
            error: error.kind().to_string(),
            message: error.to_string(),
            trace: error.trace(),
            details: if details.is_empty() {
                None
            } else {
                Some(details)
            },
            timestamp: Utc::now(),
        }
    }
}
