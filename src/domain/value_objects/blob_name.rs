use crate::domain::errors::ValidationError;

const MAX_BLOB_NAME_LEN: usize = 1024;

/// A validated bare blob name inside a single container
///
/// Names are flat: a `/` would make the name ambiguous with the final path
/// segment of the blob URL, so it is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobName(String);

impl BlobName {
    /// Create a new BlobName with validation
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::EmptyBlobName);
        }

        if value.len() > MAX_BLOB_NAME_LEN {
            return Err(ValidationError::BlobNameTooLong {
                actual: value.len(),
                max: MAX_BLOB_NAME_LEN,
            });
        }

        if let Some(c) = value.chars().find(|c| *c == '/' || *c == '\\' || c.is_control()) {
            return Err(ValidationError::InvalidBlobNameCharacter(c));
        }

        if value == "." || value == ".." {
            return Err(ValidationError::BlobNameIsRelativePath);
        }

        Ok(Self(value))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extension including the leading dot, if any
    pub fn extension(&self) -> Option<&str> {
        match self.0.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&self.0[idx..]),
        }
    }
}

impl std::fmt::Display for BlobName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for BlobName {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        BlobName::new(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_blob_names() {
        assert!(BlobName::new("photo.jpg".to_string()).is_ok());
        assert!(BlobName::new("638400000000000000_0b7e.png".to_string()).is_ok());
        assert!(BlobName::new("my photo (1).jpeg".to_string()).is_ok());
        assert!(BlobName::new("x".repeat(1024)).is_ok());
    }

    #[test]
    fn test_invalid_blob_names() {
        assert_eq!(
            BlobName::new(String::new()),
            Err(ValidationError::EmptyBlobName)
        );
        assert_eq!(
            BlobName::new("dir/photo.jpg".to_string()),
            Err(ValidationError::InvalidBlobNameCharacter('/'))
        );
        assert!(BlobName::new("null\0byte".to_string()).is_err());
        assert!(BlobName::new("..".to_string()).is_err());
        assert!(BlobName::new("x".repeat(1025)).is_err());
    }

    #[test]
    fn test_extension() {
        let name = BlobName::new("a_b.tar.gz".to_string()).unwrap();
        assert_eq!(name.extension(), Some(".gz"));

        let hidden = BlobName::new(".profile".to_string()).unwrap();
        assert_eq!(hidden.extension(), None);

        let bare = BlobName::new("README".to_string()).unwrap();
        assert_eq!(bare.extension(), None);
    }
}
