//! `Sender`: the public lifecycle wrapper around queue + aggregator thread.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::aggregator::{self, AggregatorHandle};
use crate::config::SenderConfig;
use crate::error::SenderError;
use crate::metrics::Metrics;
use crate::queue::BoundedQueue;
use crate::record::LogRecord;
use crate::uploader::{OssUploader, Uploader};

/// Lifecycle state shared between `Sender` and the aggregator thread via an
/// `AtomicU8`. `Stopping` tells the aggregator to drain and exit instead of
/// waiting indefinitely for new records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SenderState {
    Running = 0,
    Stopping = 1,
    Stopped = 2,
}

impl SenderState {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => SenderState::Running,
            1 => SenderState::Stopping,
            _ => SenderState::Stopped,
        }
    }
}

/// Entry point of this crate. Owns the bounded queue, the aggregator
/// thread, the shared uploader, and the metrics block. Cheap to clone:
/// `Sender` itself holds only `Arc`s and a shared state flag, so handing
/// copies to multiple producer threads is the intended usage.
#[derive(Clone)]
pub struct Sender {
    queue: BoundedQueue,
    metrics: Arc<Metrics>,
    state: Arc<AtomicU8>,
    shutdown_timeout: Duration,
    aggregator: Arc<parking_lot::Mutex<Option<AggregatorHandle>>>,
}

impl Sender {
    /// Build a `Sender` with the default OpenDAL-backed uploader and start
    /// its aggregator thread immediately.
    pub fn new(config: SenderConfig) -> Result<Self, SenderError> {
        let uploader = Arc::new(OssUploader::new(&config)?);
        Ok(Self::with_uploader(config, uploader))
    }

    /// Build a `Sender` against a caller-supplied `Uploader`. Used by tests
    /// and by callers targeting an object store OpenDAL doesn't cover.
    pub fn with_uploader(config: SenderConfig, uploader: Arc<dyn Uploader>) -> Self {
        let config = Arc::new(config);
        let queue = BoundedQueue::new(config.max_queue_size, config.drop_when_queue_full, config.offer_timeout);
        let metrics = Arc::new(Metrics::new());
        let state = Arc::new(AtomicU8::new(SenderState::Running as u8));
        let shutdown_timeout = config.shutdown_timeout;

        let handle = aggregator::spawn(queue.clone(), config, uploader, metrics.clone(), state.clone());

        Self {
            queue,
            metrics,
            state,
            shutdown_timeout,
            aggregator: Arc::new(parking_lot::Mutex::new(Some(handle))),
        }
    }

    /// Offer one already-serialized log line. Never blocks the caller past
    /// the configured `offer_timeout` unless `offer_timeout` is zero (wait
    /// forever). Empty input or a line consisting only of newlines is a
    /// silent no-op, not a drop. Returns `true` if the record was queued.
    pub fn offer(&self, line: impl Into<bytes::Bytes>) -> bool {
        let Some(record) = LogRecord::new(line.into()) else {
            return true;
        };

        if SenderState::from_u8(self.state.load(Ordering::Acquire)) != SenderState::Running {
            self.metrics.record_dropped();
            return false;
        }

        let accepted = self.queue.offer(record);
        if !accepted {
            self.metrics.record_dropped();
        }
        accepted
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Signal the aggregator to drain and stop, then wait up to
    /// `shutdown_timeout` for it to finish. Idempotent: calling `stop` more
    /// than once is a no-op after the first call actually stops things.
    /// Any records still queued once the budget elapses are lost.
    pub fn stop(&self) {
        let previous = self.state.swap(SenderState::Stopping as u8, Ordering::AcqRel);
        if previous != SenderState::Running as u8 {
            return;
        }

        let Some(handle) = self.aggregator.lock().take() else {
            return;
        };

        match handle.done_rx.recv_timeout(self.shutdown_timeout) {
            Ok(()) => {
                let _ = handle.join.join();
                debug!("aggregator drained and stopped cleanly");
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.shutdown_timeout.as_millis() as u64,
                    "shutdown timeout elapsed before aggregator finished draining; remaining records are lost"
                );
            }
        }

        self.state.store(SenderState::Stopped as u8, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        SenderState::from_u8(self.state.load(Ordering::Acquire)) == SenderState::Running
    }
}

impl Drop for Sender {
    /// Best-effort process-exit hook. There is no `Sender` clone counting
    /// here: every clone shares the same `Arc<Mutex<Option<AggregatorHandle>>>`,
    /// so only the clone that observes it non-empty actually runs `stop`'s
    /// drain logic — the rest see `None` and return immediately.
    fn drop(&mut self) {
        if Arc::strong_count(&self.aggregator) == 1 {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::uploader::test_support::MockUploader;

    fn config() -> SenderConfig {
        SenderConfig::builder("http://oss-endpoint", "ak", "sk", "bucket")
            .max_batch_count(1000)
            .flush_interval(Duration::from_millis(50))
            .poll_timeout(Duration::from_millis(10))
            .shutdown_timeout(Duration::from_secs(2))
            .gzip(false)
            .build()
            .unwrap()
    }

    /// Install a `tracing` subscriber so the shutdown-timeout `warn!` this
    /// test exercises is actually visible when run with `RUST_LOG=warn`.
    /// Idempotent: later calls across tests in the same process are no-ops.
    fn init_tracing() {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry().with(fmt::layer()).with(env_filter).try_init();
    }

    #[tokio::test]
    async fn offer_queues_records_and_stop_drains_them() {
        let uploader = Arc::new(MockUploader::new());
        let sender = Sender::with_uploader(config(), uploader.clone());

        assert!(sender.offer(b"a".to_vec()));
        assert!(sender.offer(b"b".to_vec()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        sender.stop();

        assert_eq!(sender.metrics().sent_records(), 2);
        assert_eq!(uploader.call_total(), 1);
    }

    #[tokio::test]
    async fn empty_and_newline_only_lines_are_silent_no_ops() {
        let uploader = Arc::new(MockUploader::new());
        let sender = Sender::with_uploader(config(), uploader.clone());

        assert!(sender.offer(Vec::<u8>::new()));
        assert!(sender.offer(b"\n".to_vec()));

        sender.stop();
        assert_eq!(sender.metrics().dropped_count(), 0);
        assert_eq!(uploader.call_total(), 0);
    }

    #[tokio::test]
    async fn offer_after_stop_is_rejected_and_counted_as_dropped() {
        let uploader = Arc::new(MockUploader::new());
        let sender = Sender::with_uploader(config(), uploader.clone());
        sender.stop();

        assert!(!sender.offer(b"late".to_vec()));
        assert_eq!(sender.metrics().dropped_count(), 1);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let uploader = Arc::new(MockUploader::new());
        let sender = Sender::with_uploader(config(), uploader.clone());
        sender.offer(b"a".to_vec());
        sender.stop();
        sender.stop();
        assert_eq!(uploader.call_total(), 1);
    }

    #[tokio::test]
    async fn drop_policy_drops_under_pressure_without_panicking() {
        let config = SenderConfig::builder("http://oss-endpoint", "ak", "sk", "bucket")
            .max_queue_size(1)
            .drop_when_queue_full(true)
            .max_batch_count(1000)
            .flush_interval(Duration::from_millis(20))
            .poll_timeout(Duration::from_millis(5))
            .shutdown_timeout(Duration::from_secs(2))
            .gzip(false)
            .build()
            .unwrap();
        let uploader = Arc::new(MockUploader::new());
        let sender = Sender::with_uploader(config, uploader.clone());

        for i in 0..100 {
            sender.offer(format!("record-{i}").into_bytes());
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        sender.stop();

        assert!(sender.metrics().dropped_count() > 0, "expected some records dropped under a 1-slot queue");
        assert!(uploader.call_total() >= 1, "expected at least one upload to have occurred");
        assert_eq!(sender.metrics().sent_records() + sender.metrics().dropped_count(), 100);
    }

    #[tokio::test]
    async fn graceful_drain_under_load_respects_shutdown_budget() {
        init_tracing();
        let shutdown_timeout = Duration::from_millis(300);
        let config = SenderConfig::builder("http://oss-endpoint", "ak", "sk", "bucket")
            .max_batch_count(100)
            .flush_interval(Duration::from_millis(20))
            .poll_timeout(Duration::from_millis(5))
            .shutdown_timeout(shutdown_timeout)
            .gzip(false)
            .build()
            .unwrap();
        // Slow enough per-batch (100ms) that draining all 10 batches (1,000
        // records / max_batch_count 100) would take ~1s, well past the 300ms
        // shutdown budget.
        let uploader = Arc::new(MockUploader::new().with_delay(Duration::from_millis(100)));
        let sender = Sender::with_uploader(config, uploader.clone());

        for i in 0..1000 {
            sender.offer(format!("record-{i}").into_bytes());
        }

        let start = std::time::Instant::now();
        sender.stop();
        let elapsed = start.elapsed();

        assert!(
            elapsed <= shutdown_timeout + Duration::from_millis(200),
            "stop() took {elapsed:?}, exceeding its shutdown budget of {shutdown_timeout:?} by more than the allowed slack"
        );

        let accounted = sender.metrics().sent_records() + sender.metrics().dropped_count();
        assert!(accounted <= 1000, "accounted records ({accounted}) exceeded what was offered");
    }
}
