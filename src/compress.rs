//! Gzip compression of an encoded batch.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("gzip compression failed: {0}")]
pub struct CompressError(String);

/// Wraps `payload` in a single gzip member. Deterministic modulo the
/// timestamp field in the gzip header — callers that need to compare
/// compressed output must decompress first.
pub fn gzip(payload: &[u8]) -> Result<Vec<u8>, CompressError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(payload)
        .map_err(|e| CompressError(e.to_string()))?;
    encoder.finish().map_err(|e| CompressError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn gunzip(bytes: &[u8]) -> Vec<u8> {
        let mut decoder = flate2::read::GzDecoder::new(bytes);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn round_trips_payload() {
        let payload = b"a\nb\nc\n";
        let compressed = gzip(payload).unwrap();
        assert_eq!(gunzip(&compressed), payload);
    }

    #[test]
    fn compressed_output_is_not_empty_for_empty_input() {
        // A gzip member always has a header/footer even for empty payloads.
        let compressed = gzip(b"").unwrap();
        assert!(!compressed.is_empty());
        assert_eq!(gunzip(&compressed), b"");
    }
}
