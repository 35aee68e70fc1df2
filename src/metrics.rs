//! Process-wide counters and the last-error publication slot.

use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;

/// Monotonic counters plus a volatile last-error message. Readable
/// concurrently; counters are updated only by the aggregator
/// (`sent_batches`, `sent_records`, `upload_dropped_count`) and by
/// producers (`dropped_count`).
#[derive(Default)]
pub struct Metrics {
    dropped_count: AtomicU64,
    upload_dropped_count: AtomicU64,
    sent_batches: AtomicU64,
    sent_records: AtomicU64,
    last_error_message: ArcSwapOption<String>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dropped(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload_dropped(&self, count: u64) {
        self.upload_dropped_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_batch_sent(&self, record_count: u64) {
        self.sent_batches.fetch_add(1, Ordering::Relaxed);
        self.sent_records.fetch_add(record_count, Ordering::Relaxed);
    }

    pub fn set_last_error(&self, message: impl Into<String>) {
        self.last_error_message.store(Some(std::sync::Arc::new(message.into())));
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn upload_dropped_count(&self) -> u64 {
        self.upload_dropped_count.load(Ordering::Relaxed)
    }

    pub fn sent_batches(&self) -> u64 {
        self.sent_batches.load(Ordering::Relaxed)
    }

    pub fn sent_records(&self) -> u64 {
        self.sent_records.load(Ordering::Relaxed)
    }

    pub fn last_error_message(&self) -> Option<String> {
        self.last_error_message.load().as_ref().map(|s| s.as_ref().clone())
    }
}
