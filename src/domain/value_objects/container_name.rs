use std::{fmt, str::FromStr};

use crate::domain::errors::ValidationError;

/// Container used when configuration does not name one
pub const DEFAULT_CONTAINER_NAME: &str = "gallery-images";

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 63;

/// Name of the storage container holding the gallery
///
/// Accepts what both an Azure container and an S3 bucket accept: 3 to 63
/// characters of `a-z`, `0-9` and single hyphens, with a letter or digit at
/// each end. Dots are refused since Azure has no use for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerName(String);

fn is_alnum(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

impl ContainerName {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        match value.len() {
            len if len < MIN_LEN => {
                return Err(ValidationError::ContainerNameTooShort {
                    actual: len,
                    min: MIN_LEN,
                })
            }
            len if len > MAX_LEN => {
                return Err(ValidationError::ContainerNameTooLong {
                    actual: len,
                    max: MAX_LEN,
                })
            }
            _ => {}
        }

        if let Some(bad) = value.chars().find(|&c| !is_alnum(c) && c != '-') {
            return Err(ValidationError::ContainerNameInvalidCharacter(bad));
        }
        if value.starts_with('-') {
            return Err(ValidationError::ContainerNameInvalidStart);
        }
        if value.ends_with('-') {
            return Err(ValidationError::ContainerNameInvalidEnd);
        }
        if value.contains("--") {
            return Err(ValidationError::ContainerNameConsecutiveHyphens);
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContainerName {
    fn default() -> Self {
        Self(DEFAULT_CONTAINER_NAME.to_string())
    }
}

/// Parses configuration values such as `--container`
impl FromStr for ContainerName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim().to_string())
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
