//! Time-bucketed study summaries.
//!
//! Records are folded into an ordered map keyed by bucket start, then each
//! bucket gets its rate and a trailing moving average. The moving average is
//! positional: a calendar period without records has no bucket and does not
//! count as zero in the window.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::constants::MOVING_AVERAGE_WINDOW;
use crate::services::period::{round2, to_fixed, Granularity};
use crate::services::ServiceError;
use crate::store::operations::records::StudyRecord;
use crate::store::operations::users::User;
use crate::store::Store;

pub const INVERTED_RANGE_ERROR: &str = "\"from\" date must be before \"to\" date";

/// One bucket `[start_date, end_date)` of a summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    pub total_word_count: u64,
    pub total_study_time_minutes: u64,
    pub record_count: u64,
    pub average_words_per_minute: f64,
    pub moving_avg_word_count: Option<f64>,
    pub moving_avg_study_time: Option<f64>,
}

#[derive(Debug, Default, Clone, Copy)]
struct BucketTotals {
    words: u64,
    minutes: u64,
    records: u64,
}

impl BucketTotals {
    fn add(&mut self, record: &StudyRecord) {
        self.words = self.words.saturating_add(record.word_count);
        self.minutes = self.minutes.saturating_add(record.study_time_minutes);
        self.records += 1;
    }

    fn words_per_minute(&self) -> f64 {
        if self.minutes == 0 {
            0.0
        } else {
            round2(self.words as f64 / self.minutes as f64)
        }
    }
}

/// Buckets `records` by `granularity` in `tz`. Input order does not matter;
/// output is ascending by bucket start.
pub fn aggregate(records: &[StudyRecord], granularity: Granularity, tz: Tz) -> Vec<PeriodSummary> {
    let mut buckets: BTreeMap<DateTime<Tz>, BucketTotals> = BTreeMap::new();
    for record in records {
        let start = granularity.truncate(record.timestamp, tz);
        buckets.entry(start).or_default().add(record);
    }

    let ordered: Vec<(DateTime<Tz>, BucketTotals)> = buckets.into_iter().collect();

    ordered
        .iter()
        .enumerate()
        .map(|(index, (start, totals))| {
            let window = (index + 1 >= MOVING_AVERAGE_WINDOW)
                .then(|| &ordered[index + 1 - MOVING_AVERAGE_WINDOW..=index]);
            let moving_avg = |pick: fn(&BucketTotals) -> u64| {
                window.map(|w| {
                    let sum: u64 = w.iter().map(|(_, t)| pick(t)).sum();
                    round2(sum as f64 / MOVING_AVERAGE_WINDOW as f64)
                })
            };

            PeriodSummary {
                start_date: to_fixed(*start),
                end_date: to_fixed(granularity.bucket_end(*start)),
                total_word_count: totals.words,
                total_study_time_minutes: totals.minutes,
                record_count: totals.records,
                average_words_per_minute: totals.words_per_minute(),
                moving_avg_word_count: moving_avg(|t| t.words),
                moving_avg_study_time: moving_avg(|t| t.minutes),
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct SummaryQuery {
    pub user_id: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub granularity: Granularity,
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub user: User,
    pub time_zone: Tz,
    pub granularity: Granularity,
    pub from: DateTime<FixedOffset>,
    pub to: DateTime<FixedOffset>,
    pub periods: Vec<PeriodSummary>,
}

/// Summarizes a user's records in `[from, to]`. Read-only and repeatable.
pub fn summarize(store: &Store, query: SummaryQuery, tz: Tz) -> Result<Summary, ServiceError> {
    if query.from > query.to {
        return Err(ServiceError::Validation(INVERTED_RANGE_ERROR.to_string()));
    }

    let user = store
        .get_user_by_id(&query.user_id)?
        .ok_or_else(|| ServiceError::user_not_found(&query.user_id))?;

    let records = store.list_user_records_between(&user.id, query.from, query.to)?;
    let periods = aggregate(&records, query.granularity, tz);

    tracing::debug!(
        user_id = %user.id,
        granularity = %query.granularity,
        records = records.len(),
        periods = periods.len(),
        "Summary computed"
    );

    Ok(Summary {
        user,
        time_zone: tz,
        granularity: query.granularity,
        from: to_fixed(query.from.with_timezone(&tz)),
        to: to_fixed(query.to.with_timezone(&tz)),
        periods,
    })
}
