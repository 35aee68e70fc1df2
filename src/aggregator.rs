//! `BatchAggregator`: the single background consumer that turns queued
//! records into uploaded objects.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::compress;
use crate::config::SenderConfig;
use crate::encoder::{self, Batch};
use crate::key::ObjectKeyBuilder;
use crate::metrics::Metrics;
use crate::queue::BoundedQueue;
use crate::record::LogRecord;
use crate::retry::{RetryConfig, RetryController};
use crate::sender::SenderState;
use crate::uploader::Uploader;

/// Handle to a spawned aggregator thread. Dropping this does not stop the
/// thread — use the shared `SenderState` to request shutdown, then wait on
/// `done_rx` (owned by `Sender::stop`).
pub struct AggregatorHandle {
    pub done_rx: std::sync::mpsc::Receiver<()>,
    pub join: std::thread::JoinHandle<()>,
}

/// Spawn the aggregator as a dedicated OS thread running its own
/// single-threaded tokio runtime, so producers calling `offer` never need
/// a tokio runtime to be present on their own thread.
pub fn spawn(
    queue: BoundedQueue,
    config: Arc<SenderConfig>,
    uploader: Arc<dyn Uploader>,
    metrics: Arc<Metrics>,
    state: Arc<std::sync::atomic::AtomicU8>,
) -> AggregatorHandle {
    let (done_tx, done_rx) = std::sync::mpsc::channel();
    let key_builder = ObjectKeyBuilder::new(config.object_key_prefix.clone(), config.app_name.clone());

    let join = std::thread::Builder::new()
        .name("oss-log-sender-aggregator".to_string())
        .spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .expect("failed to build aggregator runtime");
            rt.block_on(async {
                run_loop(queue, config, uploader.clone(), metrics, key_builder, state).await;
                if let Err(err) = uploader.close().await {
                    warn!(error = %err, "uploader close failed during shutdown");
                }
            });
            let _ = done_tx.send(());
        })
        .expect("failed to spawn aggregator thread");

    AggregatorHandle { done_rx, join }
}

/// The loop contract described in the spec: poll, opportunistically drain,
/// evaluate triggers, flush. Exposed separately from `spawn` so it can be
/// driven directly (on a tokio test runtime) without a dedicated thread.
pub async fn run_loop(
    queue: BoundedQueue,
    config: Arc<SenderConfig>,
    uploader: Arc<dyn Uploader>,
    metrics: Arc<Metrics>,
    key_builder: ObjectKeyBuilder,
    state: Arc<std::sync::atomic::AtomicU8>,
) {
    let retry = RetryController::new(RetryConfig::new(
        config.initial_backoff,
        config.backoff_multiplier,
        config.max_retries,
    ));

    let mut batch = Batch::new();
    let mut pending: Option<LogRecord> = None;
    let mut last_flush = Instant::now();

    loop {
        let running = SenderState::from_u8(state.load(Ordering::Acquire)) == SenderState::Running;
        if !running && queue.is_empty() && pending.is_none() {
            break;
        }

        let first = match pending.take() {
            Some(record) => Some(record),
            None => queue.recv_timeout(config.poll_timeout),
        };

        if let Some(record) = first {
            batch.push(record);

            // Opportunistic drain: keep pulling without blocking while both
            // bounds hold.
            loop {
                if batch.len() >= config.max_batch_count {
                    break;
                }
                match queue.try_recv() {
                    Some(next) => {
                        if batch.predicted_bytes(&next) > config.max_batch_bytes {
                            pending = Some(next);
                            break;
                        }
                        batch.push(next);
                    }
                    None => break,
                }
            }
        }

        let now = Instant::now();
        let time_trigger = now.duration_since(last_flush) >= config.flush_interval;
        let count_trigger = batch.len() >= config.max_batch_count;
        let bytes_trigger = batch.bytes() >= config.max_batch_bytes;

        if !batch.is_empty() && (time_trigger || count_trigger || bytes_trigger) {
            flush(&mut batch, &config, &uploader, &metrics, &key_builder, &retry, false).await;
            last_flush = Instant::now();
        }
    }

    // Final drain: best-effort, errors suppressed.
    if !batch.is_empty() {
        flush(&mut batch, &config, &uploader, &metrics, &key_builder, &retry, true).await;
    }

    debug!("aggregator loop exiting");
}

#[allow(clippy::too_many_arguments)]
async fn flush(
    batch: &mut Batch,
    config: &SenderConfig,
    uploader: &Arc<dyn Uploader>,
    metrics: &Metrics,
    key_builder: &ObjectKeyBuilder,
    retry: &RetryController,
    best_effort: bool,
) {
    if batch.is_empty() {
        return;
    }

    let taken = batch.take();
    let record_count = taken.len() as u64;
    let encoded = encoder::encode(&taken);

    let (payload, content_encoding): (Vec<u8>, Option<&'static str>) = if config.gzip {
        match compress::gzip(&encoded) {
            Ok(compressed) => (compressed, Some("gzip")),
            Err(err) => {
                warn!(error = %err, "gzip compression failed, falling back to uncompressed upload");
                metrics.set_last_error(format!("compression failed: {err}"));
                (encoded, None)
            }
        }
    } else {
        (encoded, None)
    };

    let key = key_builder.build(content_encoding.is_some());
    let payload = Bytes::from(payload);

    let result = retry
        .run(|_attempt| {
            let uploader = uploader.clone();
            let key = key.clone();
            let payload = payload.clone();
            let content_type = config.content_type.clone();
            async move { uploader.upload(&key, payload, &content_type, content_encoding).await }
        })
        .await;

    match result {
        Ok(()) => {
            metrics.record_batch_sent(record_count);
        }
        Err(err) => {
            metrics.record_upload_dropped(record_count);
            metrics.set_last_error(err.to_string());
            if best_effort {
                debug!(error = %err, "final drain upload failed, residual records lost");
            } else {
                error!(error = %err, records = record_count, "batch upload failed after exhausting retries, dropping batch");
            }
        }
    }
}
