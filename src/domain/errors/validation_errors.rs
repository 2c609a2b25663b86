/// Validation errors for domain value objects
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    // BlobName validation errors
    EmptyBlobName,
    BlobNameTooLong {
        actual: usize,
        max: usize,
    },
    InvalidBlobNameCharacter(char),
    BlobNameIsRelativePath,

    // ContainerName validation errors
    ContainerNameTooShort {
        actual: usize,
        min: usize,
    },
    ContainerNameTooLong {
        actual: usize,
        max: usize,
    },
    ContainerNameInvalidStart,
    ContainerNameInvalidEnd,
    ContainerNameInvalidCharacter(char),
    ContainerNameConsecutiveHyphens,

    // Blob URL errors
    InvalidBlobUrl {
        url: String,
        reason: String,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyBlobName => write!(f, "Blob name cannot be empty"),
            ValidationError::BlobNameTooLong { actual, max } => {
                write!(f, "Blob name too long: {} bytes (max: {})", actual, max)
            }
            ValidationError::InvalidBlobNameCharacter(c) => {
                write!(f, "Invalid character in blob name: {:?}", c)
            }
            ValidationError::BlobNameIsRelativePath => {
                write!(f, "Blob name cannot be '.' or '..'")
            }

            ValidationError::ContainerNameTooShort { actual, min } => {
                write!(
                    f,
                    "Container name too short: {} characters (min: {})",
                    actual, min
                )
            }
            ValidationError::ContainerNameTooLong { actual, max } => {
                write!(
                    f,
                    "Container name too long: {} characters (max: {})",
                    actual, max
                )
            }
            ValidationError::ContainerNameInvalidStart => {
                write!(f, "Container name must start with lowercase letter or number")
            }
            ValidationError::ContainerNameInvalidEnd => {
                write!(f, "Container name must end with lowercase letter or number")
            }
            ValidationError::ContainerNameInvalidCharacter(c) => {
                write!(
                    f,
                    "Invalid character in container name: '{}'. Only lowercase letters, numbers, and hyphens allowed",
                    c
                )
            }
            ValidationError::ContainerNameConsecutiveHyphens => {
                write!(f, "Container name cannot contain consecutive hyphens")
            }

            ValidationError::InvalidBlobUrl { url, reason } => {
                write!(f, "Invalid blob URL '{}': {}", url, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
