use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_GRANULARITY;
use crate::extractors::{JsonBody, QueryParams};
use crate::response::{created, ok, AppError};
use crate::services::aggregation::{self, PeriodSummary, SummaryQuery};
use crate::services::period::{to_fixed, Granularity};
use crate::state::AppState;
use crate::store::operations::users::User;
use crate::store::StoreError;
use crate::validation::{is_valid_email, parse_datetime, validate_username};

const MISSING_RANGE_ERROR: &str = "\"from\" and \"to\" parameters are required";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/:id", get(get_user))
        .route("/:id/summary", get(get_summary))
}

#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    email: String,
    username: String,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    id: String,
    email: String,
    username: String,
    created_at: DateTime<FixedOffset>,
}

impl UserResponse {
    fn new(user: User, tz: Tz) -> Self {
        Self {
            created_at: to_fixed(user.created_at.with_timezone(&tz)),
            id: user.id,
            email: user.email,
            username: user.username,
        }
    }
}

async fn create_user(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let email = req.email.trim().to_lowercase();
    let username = req.username.trim().to_string();

    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email address"));
    }
    validate_username(&username).map_err(AppError::validation)?;

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        username,
        created_at: Utc::now(),
    };

    state.store().create_user(&user).map_err(|e| match e {
        StoreError::Conflict { .. } => {
            AppError::conflict("USER_EMAIL_TAKEN", "Email is already registered")
        }
        other => other.into(),
    })?;

    Ok(created(UserResponse::new(user, state.time_zone())))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let user = state
        .store()
        .get_user_by_id(&id)?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(ok(UserResponse::new(user, state.time_zone())))
}

#[derive(Debug, Deserialize)]
struct SummaryParams {
    from: Option<String>,
    to: Option<String>,
    granularity: Option<String>,
}

#[derive(Debug, Serialize)]
struct SummaryPeriod {
    from: DateTime<FixedOffset>,
    to: DateTime<FixedOffset>,
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    user_id: String,
    user_email: String,
    timezone: &'static str,
    granularity: Granularity,
    period: SummaryPeriod,
    summary: Vec<PeriodSummary>,
}

impl SummaryParams {
    fn into_query(self, user_id: String, tz: Tz) -> Result<SummaryQuery, AppError> {
        let from = non_empty(self.from);
        let to = non_empty(self.to);
        let (Some(from), Some(to)) = (from, to) else {
            return Err(AppError::validation(MISSING_RANGE_ERROR));
        };

        let granularity = non_empty(self.granularity)
            .unwrap_or_else(|| DEFAULT_GRANULARITY.to_string())
            .parse::<Granularity>()
            .map_err(|e| AppError::validation(&e))?;

        Ok(SummaryQuery {
            user_id,
            from: parse_bound(&from, tz)?,
            to: parse_bound(&to, tz)?,
            granularity,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bound(raw: &str, tz: Tz) -> Result<DateTime<Utc>, AppError> {
    parse_datetime(raw, tz).map_err(|e| AppError::validation(&format!("Invalid date format: {e}")))
}

async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(params): QueryParams<SummaryParams>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let tz = state.time_zone();
    let query = params.into_query(id, tz)?;
    let summary = aggregation::summarize(state.store(), query, tz)?;

    Ok(ok(SummaryResponse {
        user_id: summary.user.id,
        user_email: summary.user.email,
        timezone: summary.time_zone.name(),
        granularity: summary.granularity,
        period: SummaryPeriod {
            from: summary.from,
            to: summary.to,
        },
        summary: summary.periods,
    }))
}
