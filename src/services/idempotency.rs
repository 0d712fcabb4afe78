use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Derives the idempotency key of a record submission.
///
/// SHA-256 (lowercase hex) over `{user}_{timestamp}_{words}_{minutes}`, with
/// `_{sequence}` appended for bulk-generated records. The timestamp is written
/// as UTC RFC 3339 with microsecond precision, so one instant expressed with two
/// different offsets produces the same key.
pub fn submission_id(
    user_id: &str,
    timestamp: DateTime<Utc>,
    word_count: u64,
    study_time_minutes: u64,
    sequence: Option<u64>,
) -> String {
    let ts = timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);
    let mut canonical = format!("{user_id}_{ts}_{word_count}_{study_time_minutes}");
    if let Some(seq) = sequence {
        canonical.push('_');
        canonical.push_str(&seq.to_string());
    }
    hex::encode(Sha256::digest(canonical.as_bytes()))
}
