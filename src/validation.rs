//! 公共验证函数：邮箱、用户名、计数字段以及日期时间解析，供记录、汇总与用户路由共用。

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Utc};
use chrono_tz::Tz;

use crate::constants::{USERNAME_MAX_CHARS, USERNAME_MIN_CHARS};
use crate::services::period::resolve_local;

/// 带偏移量的格式（RFC 3339 之外的 `+0200` 写法）
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// 无偏移量的格式，按参考时区解释
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 instant, a naive ISO-8601 local time or a bare `YYYY-MM-DD`
/// date. Naive values are interpreted in `tz`. The result is truncated to the
/// microsecond, the precision of record keys.
pub fn parse_datetime(raw: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    parse_instant(raw.trim(), tz)
        .map(truncate_to_micros)
        .ok_or_else(|| format!("Unable to parse date: {raw}"))
}

fn parse_instant(value: &str, tz: Tz) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(resolve_local(tz, naive).with_timezone(&Utc));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| resolve_local(tz, date.and_time(NaiveTime::MIN)).with_timezone(&Utc))
}

/// 记录键与幂等键只保留到微秒，存储和比较前统一截断
pub fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// 计数字段必须为非负整数
pub fn validate_non_negative(field: &str, value: i64) -> Result<u64, String> {
    u64::try_from(value).map_err(|_| format!("{field} must be greater than or equal to 0"))
}

/// 验证邮箱格式：user@domain.tld
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 {
        return false;
    }
    if !local
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'+' || b == b'-')
    {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    if domain.is_empty() || !domain.contains('.') {
        return false;
    }
    if !domain
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
    {
        return false;
    }
    domain
        .split('.')
        .all(|part| !part.is_empty() && !part.starts_with('-') && !part.ends_with('-'))
}

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let char_count = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&char_count) {
        return Err("username must be between 2 and 50 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ')
    {
        return Err("username may only contain letters, digits, '_', '-' and spaces");
    }
    Ok(())
}
