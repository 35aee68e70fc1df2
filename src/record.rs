//! `LogRecord`: one already-serialized log event.

use bytes::Bytes;

/// An immutable byte sequence representing one already-serialized log
/// event. Produced by the host application's logging-framework adapter;
/// consumed exactly once by the aggregator.
///
/// Trailing newlines are stripped defensively at construction — the
/// encoder owns the separator, callers must not embed one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord(Bytes);

impl LogRecord {
    /// Build a record from raw bytes. Returns `None` for empty input —
    /// empty/null payloads are rejected at the offer boundary and are not
    /// counted as dropped.
    pub fn new(line: impl Into<Bytes>) -> Option<Self> {
        let mut bytes = line.into();
        while bytes.last() == Some(&b'\n') {
            bytes.truncate(bytes.len() - 1);
        }
        if bytes.is_empty() {
            None
        } else {
            Some(LogRecord(bytes))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encoded size including the trailing newline the encoder will add.
    /// This is the quantity `BatchAggregator` uses for byte accounting.
    pub fn encoded_len(&self) -> usize {
        self.0.len() + 1
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_input() {
        assert!(LogRecord::new(Bytes::new()).is_none());
        assert!(LogRecord::new(Bytes::from_static(b"\n")).is_none());
    }

    #[test]
    fn strips_trailing_newlines() {
        let record = LogRecord::new(Bytes::from_static(b"hello\n\n")).unwrap();
        assert_eq!(record.as_bytes(), b"hello");
    }

    #[test]
    fn encoded_len_accounts_for_separator() {
        let record = LogRecord::new(Bytes::from_static(b"abcd")).unwrap();
        assert_eq!(record.encoded_len(), 5);
    }
}
