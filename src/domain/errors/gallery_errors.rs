use crate::domain::{errors::ValidationError, value_objects::BlobName};

/// Errors surfaced by gallery operations
///
/// The service never recovers from any of these; they reach the web layer
/// carrying the original message.
#[derive(Debug, Clone)]
pub enum GalleryError {
    /// Connection credential absent or malformed
    Configuration { message: String },

    /// Any failure reported by the storage backend
    Backend {
        message: String,
        /// Rendered source chain, outermost cause first
        causes: Vec<String>,
    },

    /// The named blob does not exist in the container
    NotFound { name: BlobName },

    /// A caller-supplied name or URL did not resolve to a valid blob name
    InvalidName(ValidationError),

    /// Anonymous read requested while the container is private
    AccessDenied { name: BlobName },
}

impl GalleryError {
    pub fn configuration(message: impl Into<String>) -> Self {
        GalleryError::Configuration {
            message: message.into(),
        }
    }

    /// Backend failure caused by `source`, keeping every level of its chain
    pub fn backend<E>(message: impl Into<String>, source: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut causes = vec![source.to_string()];
        let mut next = source.source();
        while let Some(cause) = next {
            causes.push(cause.to_string());
            next = cause.source();
        }

        GalleryError::Backend {
            message: message.into(),
            causes,
        }
    }

    /// Short machine-readable label used by the HTTP layer
    pub fn kind(&self) -> &'static str {
        match self {
            GalleryError::Configuration { .. } => "configuration_error",
            GalleryError::Backend { .. } => "backend_error",
            GalleryError::NotFound { .. } => "not_found",
            GalleryError::InvalidName(_) => "invalid_name",
            GalleryError::AccessDenied { .. } => "access_denied",
        }
    }

    /// Diagnostic trace lines, outermost first
    pub fn trace(&self) -> Vec<String> {
        let mut lines = vec![self.to_string()];
        match self {
            GalleryError::Backend { causes, .. } => {
                lines.extend(causes.iter().map(|cause| format!("caused by: {}", cause)))
            }
            GalleryError::InvalidName(inner) => lines.push(format!("caused by: {}", inner)),
            _ => {}
        }
        lines
    }
}

impl std::fmt::Display for GalleryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GalleryError::Configuration { message } => {
                write!(f, "Configuration error: {}", message)
            }
            GalleryError::Backend { message, .. } => {
                write!(f, "Storage backend error: {}", message)
            }
            GalleryError::NotFound { name } => {
                write!(f, "Blob not found: {}", name)
            }
            GalleryError::InvalidName(err) => {
                write!(f, "Invalid blob name: {}", err)
            }
            GalleryError::AccessDenied { name } => {
                write!(f, "Anonymous read access denied for blob: {}", name)
            }
        }
    }
}

impl std::error::Error for GalleryError {}

impl From<ValidationError> for GalleryError {
    fn from(err: ValidationError) -> Self {
        GalleryError::InvalidName(err)
    }
}

/// Result type for gallery operations
pub type GalleryResult<T> = Result<T, GalleryError>;
