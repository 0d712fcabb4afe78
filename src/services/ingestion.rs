use chrono::{DateTime, Utc};

use crate::services::idempotency::submission_id;
use crate::services::ServiceError;
use crate::store::operations::records::StudyRecord;
use crate::store::Store;
use crate::validation::{truncate_to_micros, validate_non_negative};

/// Ingestion input. Counts are signed so that negative values reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub user_id: String,
    pub word_count: i64,
    pub study_time_minutes: i64,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub record: StudyRecord,
    /// `true` when an identical submission had already been stored.
    pub duplicate: bool,
}

/// Stores a study record, or returns the already stored one when the same
/// submission was ingested before.
pub fn ingest(store: &Store, input: NewRecord) -> Result<IngestOutcome, ServiceError> {
    let (word_count, study_time_minutes) = match (
        validate_non_negative("word_count", input.word_count),
        validate_non_negative("study_time_minutes", input.study_time_minutes),
    ) {
        (Ok(words), Ok(minutes)) => (words, minutes),
        (words, minutes) => {
            let problems: Vec<String> = [words.err(), minutes.err()].into_iter().flatten().collect();
            return Err(ServiceError::Validation(problems.join("; ")));
        }
    };

    if store.get_user_by_id(&input.user_id)?.is_none() {
        return Err(ServiceError::user_not_found(&input.user_id));
    }

    let now = Utc::now();
    let timestamp = truncate_to_micros(input.timestamp.unwrap_or(now));
    let submission = submission_id(&input.user_id, timestamp, word_count, study_time_minutes, None);
    let record = StudyRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: input.user_id,
        word_count,
        study_time_minutes,
        timestamp,
        created_at: now,
        submission_id: submission,
    };

    let stored = store.get_or_create_record(&record)?;
    if stored.created {
        tracing::info!(
            user_id = %stored.record.user_id,
            record_id = %stored.record.id,
            "Study record created"
        );
    } else {
        tracing::debug!(
            user_id = %stored.record.user_id,
            record_id = %stored.record.id,
            "Duplicate submission, returning stored record"
        );
    }

    Ok(IngestOutcome {
        record: stored.record,
        duplicate: !stored.created,
    })
}
