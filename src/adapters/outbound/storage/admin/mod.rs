//! Container-level operations that object_store does not expose: creating the
//! container and setting its anonymous read access.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use crate::domain::models::PublicAccess;

mod azure;
mod s3;

pub use azure::{AzureContainerAdmin, AZURITE_ACCOUNT, AZURITE_ACCOUNT_KEY};
pub use s3::{S3BucketAdmin, S3Credentials};

/// Errors from container management requests
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("{operation} request failed")]
    Request {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} returned HTTP {status} ({code}): {message}")]
    Service {
        operation: &'static str,
        status: u16,
        code: String,
        message: String,
    },

    #[error("Request signing error: {0}")]
    Signing(String),
}

impl AdminError {
    /// Service error code, such as `ContainerAlreadyExists`
    pub fn code(&self) -> Option<&str> {
        match self {
            AdminError::Service { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Management side of a remote container
#[async_trait]
pub trait ContainerAdmin: Send + Sync + 'static {
    /// Create the container; false when it already existed
    async fn create_container(&self) -> Result<bool, AdminError>;

    /// Set the anonymous read access level of the container
    async fn set_public_access(&self, access: PublicAccess) -> Result<(), AdminError>;
}

/// `<Error><Code/><Message/></Error>` body shared by Azure and S3
#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(rename = "Code", default)]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

/// Turn a non-success response into `AdminError::Service`
async fn service_error(operation: &'static str, response: reqwest::Response) -> AdminError {
    let status = response.status().as_u16();
    let header_code = response
        .headers()
        .get("x-ms-error-code")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response.text().await.unwrap_or_default();
    let parsed: ServiceErrorBody =
        quick_xml::de::from_str(body.trim_start_matches('\u{feff}')).unwrap_or_default();

    let code = header_code
        .or_else(|| Some(parsed.code).filter(|c| !c.is_empty()))
        .unwrap_or_else(|| "Unknown".to_string());

    AdminError::Service {
        operation,
        status,
        code,
        message: parsed.message,
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AdminError> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
        .map_err(|e| AdminError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// `host[:port]` as sent in the Host header
fn host_header(url: &url::Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_sha256_known_answer() {
        // RFC 4231 test case 2
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            hex(&mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_host_header_keeps_explicit_port() {
        let url = url::Url::parse("http://127.0.0.1:9000/bucket").unwrap();
        assert_eq!(host_header(&url), "127.0.0.1:9000");

        let url = url::Url::parse("https://photos.s3.eu-west-1.amazonaws.com/").unwrap();
        assert_eq!(host_header(&url), "photos.s3.eu-west-1.amazonaws.com");
    }
}
