pub mod aggregation;
pub mod idempotency;
pub mod ingestion;
pub mod period;
pub mod seed;

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the ingestion and aggregation operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub(crate) fn user_not_found(user_id: &str) -> Self {
        ServiceError::NotFound {
            entity: "user".to_string(),
            key: user_id.to_string(),
        }
    }
}
