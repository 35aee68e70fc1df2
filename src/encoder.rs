//! `Batch` assembly and NDJSON encoding.

use crate::record::LogRecord;

/// An ordered, bounded collection of [`LogRecord`]s assembled by the
/// aggregator. Born when the aggregator accepts the first record after a
/// flush; dies on successful upload or terminal failure.
#[derive(Debug, Default)]
pub struct Batch {
    records: Vec<LogRecord>,
    bytes: usize,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and update the running byte total
    /// (`len(record) + 1` per record, per the spec's byte-accounting rule).
    pub fn push(&mut self, record: LogRecord) {
        self.bytes += record.encoded_len();
        self.records.push(record);
    }

    /// Bytes this batch would occupy once encoded, were `record` appended.
    /// Used by the aggregator's opportunistic drain to decide whether to
    /// keep pulling from the queue without blocking.
    pub fn predicted_bytes(&self, record: &LogRecord) -> usize {
        self.bytes + record.encoded_len()
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn take(&mut self) -> Batch {
        std::mem::take(self)
    }
}

/// Concatenates `record || '\n'` for every record in insertion order. Total
/// over the `Batch` contract: record admission already guarantees valid
/// UTF-8 newline-free bytes, so this never fails.
pub fn encode(batch: &Batch) -> Vec<u8> {
    let mut out = Vec::with_capacity(batch.bytes());
    for record in &batch.records {
        out.extend_from_slice(record.as_bytes());
        out.push(b'\n');
    }
    out
}
