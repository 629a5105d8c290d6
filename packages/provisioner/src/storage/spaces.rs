//! Spaces object storage
//!
//! Spaces speaks the S3 protocol, so buckets are created and filled with the
//! AWS S3 SDK pointed at the regional Spaces endpoint.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;
use tracing::debug;

/// Spaces access key pair
#[derive(Clone, PartialEq, Eq)]
pub struct SpacesCredentials {
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for SpacesCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpacesCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// A bucket in a region, reached with a key pair
#[derive(Debug, Clone)]
pub struct BucketTarget {
    pub region: String,
    pub bucket: String,
    pub credentials: SpacesCredentials,
}

impl BucketTarget {
    /// Regional S3 endpoint
    pub fn endpoint(&self) -> String {
        spaces_endpoint(&self.region)
    }

    /// URN used to move the bucket between projects
    pub fn urn(&self) -> String {
        bucket_urn(&self.bucket)
    }
}

pub fn spaces_endpoint(region: &str) -> String {
    format!("https://{}.digitaloceanspaces.com", region)
}

pub fn bucket_urn(bucket: &str) -> String {
    format!("do:space:{}", bucket)
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create a new bucket
    async fn create_bucket(&self, target: &BucketTarget) -> Result<()>;

    /// Upload one local file under `key`
    async fn upload_file(&self, target: &BucketTarget, key: &str, path: &Path) -> Result<()>;
}

/// S3 client against Spaces
#[derive(Debug, Default)]
pub struct SpacesStore;

impl SpacesStore {
    pub fn new() -> Self {
        Self
    }

    fn client(target: &BucketTarget) -> aws_sdk_s3::Client {
        let credentials = Credentials::new(
            target.credentials.access_key.clone(),
            target.credentials.secret_key.clone(),
            None,
            None,
            "spaces",
        );
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(target.region.clone()))
            .endpoint_url(target.endpoint())
            .credentials_provider(credentials)
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }
}

#[async_trait]
impl ObjectStore for SpacesStore {
    async fn create_bucket(&self, target: &BucketTarget) -> Result<()> {
        debug!(bucket = %target.bucket, endpoint = %target.endpoint(), "Creating bucket");
        Self::client(target)
            .create_bucket()
            .bucket(&target.bucket)
            .send()
            .await
            .map_err(|e| {
                anyhow!(
                    "Failed to create bucket {}: {}",
                    target.bucket,
                    DisplayErrorContext(&e)
                )
            })?;
        Ok(())
    }

    async fn upload_file(&self, target: &BucketTarget, key: &str, path: &Path) -> Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::client(target)
            .put_object()
            .bucket(&target.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                anyhow!(
                    "Failed to upload {} to s3://{}/{}: {}",
                    path.display(),
                    target.bucket,
                    key,
                    DisplayErrorContext(&e)
                )
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_and_urn() {
        let target = BucketTarget {
            region: "tor1".to_string(),
            bucket: "product-docs".to_string(),
            credentials: SpacesCredentials {
                access_key: "AK".to_string(),
                secret_key: "SK".to_string(),
            },
        };
        assert_eq!(target.endpoint(), "https://tor1.digitaloceanspaces.com");
        assert_eq!(target.urn(), "do:space:product-docs");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = SpacesCredentials {
            access_key: "AK".to_string(),
            secret_key: "very-secret".to_string(),
        };
        let shown = format!("{:?}", creds);
        assert!(shown.contains("AK"));
        assert!(!shown.contains("very-secret"));
    }
}
