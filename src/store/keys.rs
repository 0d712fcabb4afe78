use chrono::{DateTime, Utc};

pub fn user_key(user_id: &str) -> String {
    user_id.to_string()
}

pub fn user_email_index_key(email: &str) -> String {
    format!("email:{}", email.to_lowercase())
}

/// 将有符号微秒时间戳映射为保序的无符号整数（翻转符号位），1970 年之前的时间同样有序
fn sortable_micros(ts: DateTime<Utc>) -> u64 {
    (ts.timestamp_micros() as u64) ^ (1 << 63)
}

/// Records are keyed in ascending time order within a user.
pub fn record_key(user_id: &str, timestamp: DateTime<Utc>, record_id: &str) -> String {
    format!("{}:{:020}:{}", user_id, sortable_micros(timestamp), record_id)
}

pub fn record_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}

/// Inclusive lower bound for a time-range scan.
pub fn record_range_start(user_id: &str, from: DateTime<Utc>) -> String {
    format!("{}:{:020}:", user_id, sortable_micros(from))
}

/// Exclusive upper bound for a time-range scan; `;` sorts right after `:`,
/// so every record stamped exactly at `to` is still included.
pub fn record_range_end(user_id: &str, to: DateTime<Utc>) -> String {
    format!("{}:{:020};", user_id, sortable_micros(to))
}

pub fn submission_key(user_id: &str, submission_id: &str) -> String {
    format!("{}:{}", user_id, submission_id)
}
