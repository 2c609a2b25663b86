use async_trait::async_trait;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Method, Response};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use super::{hex, hmac_sha256, host_header, service_error, AdminError, ContainerAdmin};
use crate::domain::models::PublicAccess;

const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// RFC 3986 unreserved characters stay literal in SigV4 query strings
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// S3 bucket management with Signature Version 4
///
/// Requests go unsigned when no credentials are configured.
pub struct S3BucketAdmin {
    http: Client,
    bucket_url: Url,
    bucket: String,
    region: String,
    credentials: Option<S3Credentials>,
}

impl S3BucketAdmin {
    pub fn new(
        http: Client,
        bucket_url: Url,
        bucket: impl Into<String>,
        region: impl Into<String>,
        credentials: Option<S3Credentials>,
    ) -> Self {
        Self {
            http,
            bucket_url,
            bucket: bucket.into(),
            region: region.into(),
            credentials,
        }
    }

    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        query: Option<&str>,
        body: Vec<u8>,
    ) -> Result<Response, AdminError> {
        let mut url = self.bucket_url.clone();
        url.set_query(query);

        let payload_hash = hex(&Sha256::digest(&body));
        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header("x-amz-content-sha256", payload_hash.as_str())
            .header("x-amz-date", amz_date.as_str());

        if let Some(credentials) = &self.credentials {
            let authorization =
                self.authorization(credentials, &method, &url, &payload_hash, now)?;
            request = request.header("Authorization", authorization);
        }

        request
            .body(body)
            .send()
            .await
            .map_err(|source| AdminError::Request { operation, source })
    }

    fn authorization(
        &self,
        credentials: &S3Credentials,
        method: &Method,
        url: &Url,
        payload_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AdminError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/s3/aws4_request", date, self.region);

        let creq = canonical_request(method, url, payload_hash, &amz_date);
        let to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            hex(&Sha256::digest(creq.as_bytes()))
        );

        let key = signing_key(&credentials.secret_access_key, &date, &self.region, "s3")?;
        let signature = hex(&hmac_sha256(&key, to_sign.as_bytes())?);

        Ok(format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            credentials.access_key_id, scope, SIGNED_HEADERS, signature
        ))
    }

    fn read_policy(&self, access: PublicAccess) -> Option<serde_json::Value> {
        let objects = format!("arn:aws:s3:::{}/*", self.bucket);
        let bucket = format!("arn:aws:s3:::{}", self.bucket);

        let mut statements = vec![json!({
            "Sid": "PublicReadGetObject",
            "Effect": "Allow",
            "Principal": "*",
            "Action": ["s3:GetObject"],
            "Resource": [objects],
        })];

        match access {
            PublicAccess::None => return None,
            PublicAccess::Blob => {}
            PublicAccess::Container => statements.push(json!({
                "Sid": "PublicListBucket",
                "Effect": "Allow",
                "Principal": "*",
                "Action": ["s3:ListBucket"],
                "Resource": [bucket],
            })),
        }

        Some(json!({ "Version": "2012-10-17", "Statement": statements }))
    }
}

#[async_trait]
impl ContainerAdmin for S3BucketAdmin {
    async fn create_container(&self) -> Result<bool, AdminError> {
        let operation = "Create bucket";
        let body = if self.region == "us-east-1" {
            Vec::new()
        } else {
            format!(
                "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
                 <LocationConstraint>{}</LocationConstraint>\
                 </CreateBucketConfiguration>",
                self.region
            )
            .into_bytes()
        };

        let response = self.send(operation, Method::PUT, None, body).await?;
        if response.status().is_success() {
            debug!(bucket = %self.bucket, "Created bucket");
            return Ok(true);
        }

        let err = service_error(operation, response).await;
        if err.code() == Some("BucketAlreadyOwnedByYou") {
            return Ok(false);
        }
        Err(err)
    }

    async fn set_public_access(&self, access: PublicAccess) -> Result<(), AdminError> {
        let response = match self.read_policy(access) {
            Some(policy) => {
                self.send(
                    "Put bucket policy",
                    Method::PUT,
                    Some("policy"),
                    policy.to_string().into_bytes(),
                )
                .await?
            }
            None => {
                let operation = "Delete bucket policy";
                let response = self
                    .send(operation, Method::DELETE, Some("policy"), Vec::new())
                    .await?;
                if !response.status().is_success() {
                    let err = service_error(operation, response).await;
                    if err.code() == Some("NoSuchBucketPolicy") {
                        return Ok(());
                    }
                    return Err(err);
                }
                response
            }
        };

        if response.status().is_success() {
            return Ok(());
        }
        Err(service_error("Put bucket policy", response).await)
    }
}

fn canonical_request(method: &Method, url: &Url, payload_hash: &str, amz_date: &str) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            (
                utf8_percent_encode(&k, QUERY_ENCODE).to_string(),
                utf8_percent_encode(&v, QUERY_ENCODE).to_string(),
            )
        })
        .collect();
    params.sort();
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}\n{}\n{}\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
        method.as_str(),
        url.path(),
        query,
        host_header(url),
        payload_hash,
        amz_date,
        SIGNED_HEADERS,
        payload_hash
    )
}

fn signing_key(
    secret: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, AdminError> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}
