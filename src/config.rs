//! Sender configuration.

use std::time::Duration;

use crate::error::SenderError;

/// Immutable configuration snapshot captured at `Sender` construction and
/// never mutated afterward.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct SenderConfig {
    pub endpoint: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub bucket: String,

    pub app_name: String,
    pub object_key_prefix: String,

    pub max_queue_size: usize,
    pub max_batch_count: usize,
    pub max_batch_bytes: usize,
    pub flush_interval: Duration,
    pub offer_timeout: Duration,
    pub drop_when_queue_full: bool,

    pub gzip: bool,
    pub content_type: String,

    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: f64,

    pub poll_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl SenderConfig {
    /// Start building a config for the given required endpoint/credentials/bucket.
    pub fn builder(
        endpoint: impl Into<String>,
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        bucket: impl Into<String>,
    ) -> SenderConfigBuilder {
        SenderConfigBuilder::new(endpoint, access_key_id, access_key_secret, bucket)
    }

    /// `offer_timeout <= 0` means "wait forever" per the admission policy table.
    pub fn waits_forever(&self) -> bool {
        self.offer_timeout.is_zero()
    }
}

/// Builder for [`SenderConfig`], mirroring the defaults enumerated in the
/// configuration table.
#[must_use = "builders do nothing unless you call .build()"]
pub struct SenderConfigBuilder {
    endpoint: String,
    access_key_id: String,
    access_key_secret: String,
    bucket: String,

    app_name: String,
    object_key_prefix: String,

    max_queue_size: usize,
    max_batch_count: usize,
    max_batch_bytes: usize,
    flush_interval: Duration,
    offer_timeout: Duration,
    drop_when_queue_full: bool,

    gzip: bool,
    content_type: String,

    max_retries: u32,
    initial_backoff: Duration,
    backoff_multiplier: f64,

    poll_timeout: Duration,
    shutdown_timeout: Duration,
}

impl SenderConfigBuilder {
    pub(crate) fn new(
        endpoint: impl Into<String>,
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            bucket: bucket.into(),

            app_name: "app".to_string(),
            object_key_prefix: "logs/".to_string(),

            max_queue_size: 200_000,
            max_batch_count: 5_000,
            max_batch_bytes: 4 * 1024 * 1024,
            flush_interval: Duration::from_millis(2_000),
            offer_timeout: Duration::from_millis(500),
            drop_when_queue_full: false,

            gzip: true,
            content_type: "application/x-ndjson".to_string(),

            max_retries: 5,
            initial_backoff: Duration::from_millis(200),
            backoff_multiplier: 2.0,

            poll_timeout: Duration::from_millis(200),
            shutdown_timeout: Duration::from_secs(5),
        }
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn object_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.object_key_prefix = prefix.into();
        self
    }

    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    pub fn max_batch_count(mut self, count: usize) -> Self {
        self.max_batch_count = count;
        self
    }

    pub fn max_batch_bytes(mut self, bytes: usize) -> Self {
        self.max_batch_bytes = bytes;
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// `Duration::ZERO` (or any zero-length duration) means "wait forever"
    /// when the queue is full.
    pub fn offer_timeout(mut self, timeout: Duration) -> Self {
        self.offer_timeout = timeout;
        self
    }

    pub fn drop_when_queue_full(mut self, drop: bool) -> Self {
        self.drop_when_queue_full = drop;
        self
    }

    pub fn gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<SenderConfig, SenderError> {
        if self.endpoint.is_empty() {
            return Err(SenderError::InvalidConfig("endpoint must not be empty".into()));
        }
        if self.bucket.is_empty() {
            return Err(SenderError::InvalidConfig("bucket must not be empty".into()));
        }
        if self.max_queue_size == 0 {
            return Err(SenderError::InvalidConfig("max_queue_size must be > 0".into()));
        }
        if self.max_batch_count == 0 {
            return Err(SenderError::InvalidConfig("max_batch_count must be > 0".into()));
        }
        if self.max_batch_bytes == 0 {
            return Err(SenderError::InvalidConfig("max_batch_bytes must be > 0".into()));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(SenderError::InvalidConfig(
                "backoff_multiplier must be >= 1.0".into(),
            ));
        }

        Ok(SenderConfig {
            endpoint: self.endpoint,
            access_key_id: self.access_key_id,
            access_key_secret: self.access_key_secret,
            bucket: self.bucket,
            app_name: self.app_name,
            object_key_prefix: self.object_key_prefix,
            max_queue_size: self.max_queue_size,
            max_batch_count: self.max_batch_count,
            max_batch_bytes: self.max_batch_bytes,
            flush_interval: self.flush_interval,
            offer_timeout: self.offer_timeout,
            drop_when_queue_full: self.drop_when_queue_full,
            gzip: self.gzip,
            content_type: self.content_type,
            max_retries: self.max_retries,
            initial_backoff: self.initial_backoff,
            backoff_multiplier: self.backoff_multiplier,
            poll_timeout: self.poll_timeout,
            shutdown_timeout: self.shutdown_timeout,
        })
    }
}
