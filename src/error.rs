//! Error types for the sender.

use thiserror::Error;

/// Error surfaced by the `Uploader` trait.
///
/// Carries enough information for `RetryController` to log and for future
/// `Uploader` implementations to discriminate retriable from terminal
/// failures without forcing that distinction on every implementation.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum UploadError {
    #[error("object storage request failed: {message}")]
    Backend { message: String },

    #[error("object storage request timed out")]
    Timeout,

    #[error("object storage rejected the request: status {status}, {message}")]
    Rejected { status: u16, message: String },
}

impl UploadError {
    /// Whether this error is worth retrying. The default `RetryController`
    /// ignores this (it retries unconditionally per spec) but the hook is
    /// here for implementations that want to short-circuit on permanent
    /// failures.
    pub fn is_retriable(&self) -> bool {
        match self {
            UploadError::Backend { .. } | UploadError::Timeout => true,
            UploadError::Rejected { status, .. } => *status >= 500 || *status == 429,
        }
    }
}

impl From<opendal::Error> for UploadError {
    fn from(err: opendal::Error) -> Self {
        if matches!(err.kind(), opendal::ErrorKind::RequestTimeout) {
            UploadError::Timeout
        } else {
            UploadError::Backend {
                message: err.to_string(),
            }
        }
    }
}

/// Top-level error returned from fallible `Sender` construction. `offer()`
/// itself never returns an error — failures past this point are only
/// observable through `Metrics`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SenderError {
    #[error("invalid sender configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to initialize object storage operator: {0}")]
    StorageInit(String),
}
