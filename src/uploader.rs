//! `Uploader`: the object-storage interface boundary, plus a default
//! implementation backed by an OpenDAL operator.

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::SenderConfig;
use crate::error::{SenderError, UploadError};

/// Consumed by `RetryController`. Implementations PUT `content` at
/// `object_key` in the configured bucket, setting `Content-Type` and
/// (when `Some`) `Content-Encoding`. Errors propagate to trigger retry.
///
/// This is the sole collaborator this crate treats as external: concrete
/// authentication, request signing, TLS, and connection pooling are owned
/// by the implementation, not by the sender core.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(
        &self,
        object_key: &str,
        content: Bytes,
        content_type: &str,
        content_encoding: Option<&str>,
    ) -> Result<(), UploadError>;

    /// Release any held resources. Called once during `Sender::stop`.
    /// Default is a no-op for uploaders with nothing to tear down.
    async fn close(&self) -> Result<(), UploadError> {
        Ok(())
    }
}

/// Default `Uploader`, backed by an OpenDAL operator pointed at an
/// Aliyun-OSS-compatible (or plain S3-compatible, via the `s3` feature)
/// endpoint.
pub struct OssUploader {
    operator: opendal::Operator,
    bucket: String,
}

impl OssUploader {
    /// Build an operator from `config`'s endpoint/credentials/bucket.
    pub fn new(config: &SenderConfig) -> Result<Self, SenderError> {
        #[cfg(feature = "oss")]
        let builder = opendal::services::Oss::default()
            .endpoint(&config.endpoint)
            .bucket(&config.bucket)
            .access_key_id(&config.access_key_id)
            .access_key_secret(&config.access_key_secret);

        #[cfg(all(not(feature = "oss"), feature = "s3"))]
        let builder = opendal::services::S3::default()
            .endpoint(&config.endpoint)
            .bucket(&config.bucket)
            .access_key_id(&config.access_key_id)
            .secret_access_key(&config.access_key_secret);

        let operator = opendal::Operator::new(builder)
            .map_err(|e| SenderError::StorageInit(e.to_string()))?
            .finish();

        Ok(Self {
            operator,
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl Uploader for OssUploader {
    async fn upload(
        &self,
        object_key: &str,
        content: Bytes,
        content_type: &str,
        content_encoding: Option<&str>,
    ) -> Result<(), UploadError> {
        tracing::debug!(bucket = %self.bucket, key = object_key, bytes = content.len(), "uploading batch");

        let mut write = self.operator.write_with(object_key, content).content_type(content_type);
        if let Some(encoding) = content_encoding {
            write = write.content_encoding(encoding);
        }
        write.await?;
        Ok(())
    }
}
