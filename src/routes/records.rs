use axum::extract::State;
use axum::routing::post;
use axum::Router;
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::extractors::JsonBody;
use crate::response::{created, AppError};
use crate::services::ingestion::{self, IngestOutcome, NewRecord};
use crate::services::period::to_fixed;
use crate::state::AppState;
use crate::validation::parse_datetime;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_record))
}

/// Every field is optional at the serde level so that missing fields are
/// reported together as one validation error.
#[derive(Debug, Deserialize)]
struct CreateRecordRequest {
    user_id: Option<String>,
    word_count: Option<i64>,
    study_time_minutes: Option<i64>,
    timestamp: Option<String>,
}

impl CreateRecordRequest {
    fn into_new_record(self, tz: Tz) -> Result<NewRecord, AppError> {
        let missing: Vec<&str> = [
            ("user_id", self.user_id.as_deref().map_or(true, |s| s.trim().is_empty())),
            ("word_count", self.word_count.is_none()),
            ("study_time_minutes", self.study_time_minutes.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();

        let (Some(user_id), Some(word_count), Some(study_time_minutes)) =
            (self.user_id, self.word_count, self.study_time_minutes)
        else {
            return Err(missing_fields(&missing));
        };
        if !missing.is_empty() {
            return Err(missing_fields(&missing));
        }

        let timestamp = match self.timestamp.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                parse_datetime(raw, tz)
                    .map_err(|e| AppError::validation(&format!("Invalid date format: {e}")))?,
            ),
        };

        Ok(NewRecord {
            user_id: user_id.trim().to_string(),
            word_count,
            study_time_minutes,
            timestamp,
        })
    }
}

fn missing_fields(fields: &[&str]) -> AppError {
    AppError::validation(&format!("Missing required fields: {}", fields.join(", ")))
}

#[derive(Debug, Serialize)]
struct RecordResponse {
    id: String,
    user_id: String,
    word_count: u64,
    study_time_minutes: u64,
    timestamp: DateTime<FixedOffset>,
    duplicate: bool,
}

impl RecordResponse {
    fn from_outcome(outcome: IngestOutcome, tz: Tz) -> Self {
        let record = outcome.record;
        Self {
            timestamp: to_fixed(record.timestamp.with_timezone(&tz)),
            id: record.id,
            user_id: record.user_id,
            word_count: record.word_count,
            study_time_minutes: record.study_time_minutes,
            duplicate: outcome.duplicate,
        }
    }
}

async fn create_record(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateRecordRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let tz = state.time_zone();
    let input = req.into_new_record(tz)?;
    let outcome = ingestion::ingest(state.store(), input)?;
    Ok(created(RecordResponse::from_outcome(outcome, tz)))
}
