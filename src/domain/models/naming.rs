use chrono::{DateTime, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;
use uuid::Uuid;

use crate::domain::{
    errors::ValidationError,
    models::BlobDescriptor,
    value_objects::BlobName,
};

/// Ticks (100 ns units since 0001-01-01T00:00:00Z) at the Unix epoch
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

const MAX_EXTENSION_LEN: usize = 16;

/// Characters left as-is in a blob URL path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Timestamp in ticks, used as the sortable prefix of generated names
pub fn ticks(now: DateTime<Utc>) -> i64 {
    UNIX_EPOCH_TICKS
        + now.timestamp() * 10_000_000
        + i64::from(now.timestamp_subsec_nanos() / 100)
}

/// Extension of an uploaded file name, including the dot
///
/// Browsers may send a full client path, so only the final component counts.
/// Extensions that are not short ASCII alphanumerics are dropped rather than
/// carried into the stored name.
pub fn upload_extension(original_filename: &str) -> Option<&str> {
    let file_name = original_filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(original_filename);

    let idx = file_name.rfind('.')?;
    let ext = &file_name[idx + 1..];

    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }

    Some(&file_name[idx..])
}

/// Collision-resistant stored name: `<ticks>_<uuid v4><extension>`
///
/// The tick prefix only orders names for humans; the UUID is what keeps two
/// uploads in the same tick apart.
pub fn generate_blob_name(
    original_filename: &str,
    now: DateTime<Utc>,
) -> Result<BlobName, ValidationError> {
    let name = format!(
        "{}_{}{}",
        ticks(now),
        Uuid::new_v4(),
        upload_extension(original_filename).unwrap_or("")
    );

    BlobName::new(name)
}

/// Public URL of a blob under the given container URI
pub fn blob_url(container_uri: &str, name: &BlobName) -> String {
    format!(
        "{}/{}",
        container_uri.trim_end_matches('/'),
        utf8_percent_encode(name.as_str(), PATH_SEGMENT)
    )
}

/// Build the descriptor the gallery shows for a blob
pub fn describe(container_uri: &str, name: BlobName) -> BlobDescriptor {
    let url = blob_url(container_uri, &name);
    BlobDescriptor { name, url }
}

/// Recover the bare blob name from a blob URL
///
/// Takes the final path segment and percent-decodes it, which is the inverse
/// of [`blob_url`].
pub fn extract_object_name(url: &str) -> Result<BlobName, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidBlobUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;

    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| invalid("URL has no final path segment"))?;

    let decoded = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|e| invalid(&e.to_string()))?;

    BlobName::new(decoded.into_owned())
}
