//! `BoundedQueue`: a multi-producer, single-consumer FIFO of [`LogRecord`]s
//! with three admission policies selected by config.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};
use tracing::trace;

use crate::record::LogRecord;

/// Bounded FIFO of encoded log records. Cloning a `BoundedQueue` shares the
/// same underlying channel — every producer thread holds a clone, the
/// aggregator thread holds the one consumer side.
#[derive(Clone)]
pub struct BoundedQueue {
    tx: Sender<LogRecord>,
    rx: Receiver<LogRecord>,
    drop_when_full: bool,
    offer_timeout: Duration,
}

impl BoundedQueue {
    pub fn new(capacity: usize, drop_when_full: bool, offer_timeout: Duration) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self {
            tx,
            rx,
            drop_when_full,
            offer_timeout,
        }
    }

    /// Admit `record` according to the configured policy. Returns `true`
    /// if the record was queued, `false` if it was dropped (drop policy,
    /// or the consumer side has gone away during shutdown).
    pub fn offer(&self, record: LogRecord) -> bool {
        if self.drop_when_full {
            match self.tx.try_send(record) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    trace!("queue full, dropping record under drop-on-full policy");
                    false
                }
                Err(TrySendError::Disconnected(_)) => false,
            }
        } else if self.offer_timeout.is_zero() {
            self.tx.send(record).is_ok()
        } else {
            match self.tx.send_timeout(record, self.offer_timeout) {
                Ok(()) => true,
                // Timed out but not dropping: fall through to an
                // unconditional block until space frees up.
                Err(SendTimeoutError::Timeout(record)) => self.tx.send(record).is_ok(),
                Err(SendTimeoutError::Disconnected(_)) => false,
            }
        }
    }

    /// Block for up to `timeout` waiting for the next record. Used by the
    /// aggregator so its loop cannot starve the time-based flush trigger.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<LogRecord> {
        match self.rx.recv_timeout(timeout) {
            Ok(record) => Some(record),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Non-blocking drain, used for the opportunistic "pull more without
    /// waiting" step of the aggregator loop.
    pub fn try_recv(&self) -> Option<LogRecord> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(s: &str) -> LogRecord {
        LogRecord::new(s.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn drop_policy_rejects_past_capacity() {
        let queue = BoundedQueue::new(1, true, Duration::from_millis(0));
        assert!(queue.offer(record("a")));
        assert!(!queue.offer(record("b")));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn wait_forever_blocks_until_consumer_drains() {
        let queue = BoundedQueue::new(1, false, Duration::ZERO);
        assert!(queue.offer(record("a")));

        let producer = queue.clone();
        let handle = std::thread::spawn(move || producer.offer(record("b")));

        // Give the blocked producer thread a moment to actually block.
        std::thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());

        assert_eq!(queue.recv_timeout(Duration::from_secs(1)).unwrap().as_bytes(), b"a");
        assert!(handle.join().unwrap());
    }

    #[test]
    fn blocking_with_timeout_falls_through_to_unconditional_block() {
        let queue = BoundedQueue::new(1, false, Duration::from_millis(10));
        assert!(queue.offer(record("a")));

        let producer = queue.clone();
        let handle = std::thread::spawn(move || producer.offer(record("b")));

        // The timeout elapses with the queue still full; the producer
        // keeps waiting unconditionally rather than dropping.
        std::thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());

        queue.recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn try_recv_does_not_block_when_empty() {
        let queue = BoundedQueue::new(4, false, Duration::from_millis(10));
        assert!(queue.try_recv().is_none());
    }
}
