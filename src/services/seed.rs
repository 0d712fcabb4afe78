//! Synthetic record generation for demos and load testing.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::constants::SEED_LOOKBACK_DAYS;
use crate::services::idempotency::submission_id;
use crate::services::ServiceError;
use crate::store::operations::records::StudyRecord;
use crate::store::Store;
use crate::validation::truncate_to_micros;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub cleared: usize,
}

/// Generates `count` random records for an existing user, spread over the
/// `SEED_LOOKBACK_DAYS` days before `now`.
///
/// Each key carries the loop index as sequence discriminator, so generated
/// records never collapse into one another even with identical field values.
pub fn generate_records<R: Rng>(
    store: &Store,
    user_id: &str,
    count: usize,
    clear_existing: bool,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<SeedReport, ServiceError> {
    if store.get_user_by_id(user_id)?.is_none() {
        return Err(ServiceError::user_not_found(user_id));
    }

    let cleared = if clear_existing {
        store.delete_user_records(user_id)?
    } else {
        0
    };

    let base = truncate_to_micros(now) - Duration::days(SEED_LOOKBACK_DAYS);
    let mut created = 0usize;
    for i in 0..count {
        let timestamp = base
            + Duration::days(rng.gen_range(0..=SEED_LOOKBACK_DAYS))
            + Duration::hours(rng.gen_range(0..=23))
            + Duration::minutes(rng.gen_range(0..=59))
            + Duration::seconds(i as i64)
            + Duration::milliseconds(rng.gen_range(0..=999));
        let word_count: u64 = rng.gen_range(10..=100);
        let study_time_minutes: u64 = rng.gen_range(5..=60);

        let record = StudyRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            word_count,
            study_time_minutes,
            timestamp,
            created_at: Utc::now(),
            submission_id: submission_id(
                user_id,
                timestamp,
                word_count,
                study_time_minutes,
                Some(i as u64),
            ),
        };
        if store.get_or_create_record(&record)?.created {
            created += 1;
        }
    }

    tracing::info!(user_id, created, cleared, "Generated synthetic records");
    Ok(SeedReport { created, cleared })
}
