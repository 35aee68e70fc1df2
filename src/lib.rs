//! oss-log-sender
//!
//! An async, batching log-shipping sender for S3-compatible object storage
//! (Aliyun OSS is the reference target; plain S3 is available behind the
//! `s3` feature). Producers call [`Sender::offer`] from any thread — it
//! never requires a tokio runtime on the caller's side. Records are
//! batched, optionally gzip-compressed, and uploaded by a single dedicated
//! background thread once a time, count, or byte bound is crossed.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use oss_log_sender::{Sender, SenderConfig};
//!
//! let config = SenderConfig::builder("https://oss-cn-hangzhou.aliyuncs.com", "ak", "sk", "my-bucket")
//!     .app_name("checkout-service")
//!     .build()
//!     .unwrap();
//!
//! let sender = Sender::new(config).unwrap();
//! sender.offer(b"{\"level\":\"info\",\"msg\":\"hello\"}\n".to_vec());
//! sender.stop();
//! ```

mod aggregator;
mod compress;
mod config;
mod encoder;
mod error;
mod key;
mod metrics;
mod queue;
mod record;
mod retry;
mod sender;
mod uploader;

pub use config::{SenderConfig, SenderConfigBuilder};
pub use error::{SenderError, UploadError};
pub use metrics::Metrics;
pub use record::LogRecord;
pub use retry::{JitterMode, RetryConfig};
pub use sender::{Sender, SenderState};
pub use uploader::{OssUploader, Uploader};
