//! Amazon S3 (or S3-compatible) implementation of [`BlobStore`].
//!
//! Credentials and region come from the standard AWS provider chain
//! (environment, profile, instance/task role). A custom endpoint switches to
//! path-style addressing so MinIO and similar stores work.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{debug, info};

use super::{BlobStore, Precondition, StoreError, VersionedBlob};

/// S3 error codes returned when a conditional write loses a race.
const CONFLICT_CODES: &[&str] = &["PreconditionFailed", "ConditionalRequestConflict"];

/// Connection settings for [`S3BlobStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3Config {
    pub bucket: String,
    /// Overrides the region from the provider chain.
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores.
    pub endpoint_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Resolve AWS configuration and build the client.
    pub async fn connect(cfg: S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = cfg.region.clone() {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &cfg.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        info!(bucket = %cfg.bucket, endpoint = ?cfg.endpoint_url, "S3 blob store ready");
        Self::from_client(Client::from_conf(builder.build()), cfg.bucket)
    }

    pub fn from_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn fetch(&self, key: &str) -> Result<Option<VersionedBlob>, StoreError> {
        let output = match self.client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(output) => output,
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    debug!(bucket = %self.bucket, key, "object not found; treating as empty");
                    return Ok(None);
                }
                return Err(StoreError::backend("fetch", key, DisplayErrorContext(&err).to_string()));
            }
        };

        let version = output.e_tag().map(str::to_owned);
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::backend("fetch", key, e.to_string()))?
            .into_bytes();

        debug!(bucket = %self.bucket, key, size = bytes.len(), etag = ?version, "object fetched");
        Ok(Some(VersionedBlob { bytes, version }))
    }

    async fn replace(&self, key: &str, bytes: Bytes, precondition: Precondition) -> Result<(), StoreError> {
        let size = bytes.len();
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(bytes));

        request = match precondition {
            Precondition::None => request,
            Precondition::Absent => request.if_none_match("*"),
            Precondition::Matches(etag) => request.if_match(etag),
        };

        match request.send().await {
            Ok(_) => {
                debug!(bucket = %self.bucket, key, size, "object replaced");
                Ok(())
            }
            Err(err) => {
                let code = err.as_service_error().and_then(|e| e.code());
                if code.is_some_and(|c| CONFLICT_CODES.contains(&c)) {
                    return Err(StoreError::PreconditionFailed { key: key.to_owned() });
                }
                Err(StoreError::backend("replace", key, DisplayErrorContext(&err).to_string()))
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
