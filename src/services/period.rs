//! Calendar arithmetic for summary buckets.
//!
//! All truncation happens on local wall-clock time in the reference zone and is
//! mapped back to an instant with [`resolve_local`].

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    Offset, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::SUMMARY_DECIMAL_PLACES;

pub const GRANULARITY_ERROR: &str = "Granularity must be hour, day, or month";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Month,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Hour, Granularity::Day, Granularity::Month];

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Month => "month",
        }
    }

    /// Start of the bucket containing `ts`, in `tz`.
    pub fn truncate(self, ts: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
        let zoned = ts.with_timezone(&tz);
        let local = zoned.naive_local();
        let truncated = match self {
            // 在实际时刻上回退，夏令时重复的那一小时各自成桶
            Granularity::Hour => {
                return zoned
                    - Duration::minutes(i64::from(zoned.minute()))
                    - Duration::seconds(i64::from(zoned.second()))
                    - Duration::nanoseconds(i64::from(zoned.nanosecond()));
            }
            Granularity::Day => local.date().and_time(NaiveTime::MIN),
            Granularity::Month => {
                first_of_month(local.year(), local.month()).and_time(NaiveTime::MIN)
            }
        };
        resolve_local(tz, truncated)
    }

    /// Exclusive end of the bucket starting at `start`.
    pub fn bucket_end(self, start: DateTime<Tz>) -> DateTime<Tz> {
        let tz = start.timezone();
        match self {
            Granularity::Hour => start + Duration::hours(1),
            // 从下一个本地零点算起，而不是沿用 start 的时刻（零点可能落在夏令时空隙里）
            Granularity::Day => {
                let date = start.naive_local().date();
                let next = date.succ_opt().unwrap_or(date);
                resolve_local(tz, next.and_time(NaiveTime::MIN))
            }
            Granularity::Month => {
                let local = start.naive_local();
                let (year, month) = next_month(local.year(), local.month());
                resolve_local(tz, first_of_month(year, month).and_time(NaiveTime::MIN))
            }
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Granularity::Hour),
            "day" => Ok(Granularity::Day),
            "month" => Ok(Granularity::Month),
            _ => Err(GRANULARITY_ERROR.to_string()),
        }
    }
}

/// December rolls over to January of the following year.
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Maps a local wall-clock time to an instant in `tz`.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times inside a DST
/// gap move forward to the first valid local time after the gap.
pub fn resolve_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    let mut candidate = naive;
    // 夏令时跳变最长不超过 24 小时，逐 15 分钟前移即可跳出空隙
    for _ in 0..96 {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => candidate += Duration::minutes(15),
        }
    }
    tz.from_utc_datetime(&naive)
}

pub fn to_fixed(dt: DateTime<Tz>) -> DateTime<FixedOffset> {
    let offset = dt.offset().fix();
    dt.with_timezone(&offset)
}

/// Rounds half away from zero to the summary precision.
pub fn round2(value: f64) -> f64 {
    let factor = 10f64.powi(SUMMARY_DECIMAL_PLACES);
    (value * factor).round() / factor
}
