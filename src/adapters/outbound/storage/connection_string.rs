use std::{collections::HashMap, path::PathBuf};

use super::error::StoreError;

/// Backend selected by a storage connection string
///
/// Accepted forms:
/// - `memory://`
/// - `file://<directory>`
/// - `UseDevelopmentStorage=true`
/// - `AccountName=..;AccountKey=..[;DefaultEndpointsProtocol=..][;EndpointSuffix=..][;BlobEndpoint=..]`
/// - `Region=..[;AccessKeyId=..][;SecretAccessKey=..][;Endpoint=..]`
#[derive(Clone, PartialEq)]
pub enum ConnectionString {
    InMemory,
    LocalFileSystem {
        root: PathBuf,
    },
    AzureEmulator,
    Azure {
        account: String,
        access_key: String,
        protocol: String,
        endpoint_suffix: String,
        blob_endpoint: Option<String>,
    },
    S3 {
        region: String,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        endpoint: Option<String>,
    },
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let raw = raw.trim();

        if raw.eq_ignore_ascii_case("memory://") {
            return Ok(ConnectionString::InMemory);
        }

        if let Some(root) = raw.strip_prefix("file://") {
            if root.is_empty() {
                return Err(StoreError::InvalidConnectionString(
                    "file:// requires a directory".to_string(),
                ));
            }
            return Ok(ConnectionString::LocalFileSystem {
                root: PathBuf::from(root),
            });
        }

        let mut settings = parse_settings(raw)?;

        if settings
            .get("usedevelopmentstorage")
            .map_or(false, |v| v.eq_ignore_ascii_case("true"))
        {
            return Ok(ConnectionString::AzureEmulator);
        }

        if let Some(account) = settings.remove("accountname") {
            let access_key = settings
                .remove("accountkey")
                .ok_or(StoreError::MissingSetting("AccountKey"))?;
            return Ok(ConnectionString::Azure {
                account,
                access_key,
                protocol: settings
                    .remove("defaultendpointsprotocol")
                    .unwrap_or_else(|| "https".to_string()),
                endpoint_suffix: settings
                    .remove("endpointsuffix")
                    .unwrap_or_else(|| "core.windows.net".to_string()),
                blob_endpoint: settings
                    .remove("blobendpoint")
                    .map(|e| e.trim_end_matches('/').to_string()),
            });
        }

        if let Some(region) = settings.remove("region") {
            return Ok(ConnectionString::S3 {
                region,
                access_key_id: settings.remove("accesskeyid"),
                secret_access_key: settings.remove("secretaccesskey"),
                endpoint: settings
                    .remove("endpoint")
                    .map(|e| e.trim_end_matches('/').to_string()),
            });
        }

        Err(StoreError::InvalidConnectionString(
            "expected memory://, file://<dir>, an Azure account or an S3 region".to_string(),
        ))
    }

    /// Backend label safe to log
    pub fn backend(&self) -> &'static str {
        match self {
            ConnectionString::InMemory => "memory",
            ConnectionString::LocalFileSystem { .. } => "local",
            ConnectionString::AzureEmulator => "azurite",
            ConnectionString::Azure { .. } => "azure",
            ConnectionString::S3 { .. } => "s3",
        }
    }
}

// Keys never end up in logs
impl std::fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionString::LocalFileSystem { root } => {
                f.debug_struct("LocalFileSystem").field("root", root).finish()
            }
            ConnectionString::Azure { account, .. } => f
                .debug_struct("Azure")
                .field("account", account)
                .finish_non_exhaustive(),
            ConnectionString::S3 {
                region, endpoint, ..
            } => f
                .debug_struct("S3")
                .field("region", region)
                .field("endpoint", endpoint)
                .finish_non_exhaustive(),
            other => f.write_str(other.backend()),
        }
    }
}

/// Split `Key=Value;Key=Value` into lowercase keys
fn parse_settings(raw: &str) -> Result<HashMap<String, String>, StoreError> {
    let mut settings = HashMap::new();

    for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, value) = segment.split_once('=').ok_or_else(|| {
            StoreError::InvalidConnectionString(format!("segment without '=': {}", key_hint(segment)))
        })?;
        settings.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    if settings.is_empty() {
        return Err(StoreError::InvalidConnectionString(
            "connection string is empty".to_string(),
        ));
    }

    Ok(settings)
}

// A malformed segment may be a secret; show only its start.
fn key_hint(segment: &str) -> String {
    let hint: String = segment.chars().take(12).collect();
    if hint.len() < segment.len() {
        format!("{}...", hint)
    } else {
        hint
    }
}
