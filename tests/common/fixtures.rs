use chrono::{DateTime, Utc};

use study_tracker::services::ingestion::{ingest, NewRecord};
use study_tracker::store::operations::records::StudyRecord;
use study_tracker::store::operations::users::User;
use study_tracker::store::Store;

pub fn seed_user(store: &Store, email: &str, username: &str) -> User {
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email: email.to_string(),
        username: username.to_string(),
        created_at: Utc::now(),
    };
    store.create_user(&user).expect("create seed user");
    user
}

pub fn seed_record(
    store: &Store,
    user_id: &str,
    timestamp: DateTime<Utc>,
    word_count: i64,
    study_time_minutes: i64,
) -> StudyRecord {
    ingest(
        store,
        NewRecord {
            user_id: user_id.to_string(),
            word_count,
            study_time_minutes,
            timestamp: Some(timestamp),
        },
    )
    .expect("ingest seed record")
    .record
}
