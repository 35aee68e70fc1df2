//! `ObjectKeyBuilder`: unique, dated destination keys per batch.

use chrono::Utc;
use uuid::Uuid;

/// Builds object keys of the form
/// `{object_key_prefix}{app_name}/{yyyy-MM-dd}/{uuidv4}.jsonl[.gz]`.
///
/// The date is computed at flush time in UTC; the UUID is a random 128-bit
/// value, so the key is unique per batch with overwhelming probability.
/// Callers must not rely on any ordering implied by keys.
pub struct ObjectKeyBuilder {
    prefix: String,
    app_name: String,
}

impl ObjectKeyBuilder {
    pub fn new(prefix: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            app_name: app_name.into(),
        }
    }

    /// Build a key for a batch flushed "now". `gzip` selects the `.jsonl`
    /// vs `.jsonl.gz` suffix.
    pub fn build(&self, gzip: bool) -> String {
        let date = Utc::now().format("%Y-%m-%d");
        let uuid = Uuid::new_v4();
        let suffix = if gzip { "jsonl.gz" } else { "jsonl" };
        format!("{}{}/{}/{}.{}", self.prefix, self.app_name, date, uuid, suffix)
    }
}
