use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;

use crate::store::keys;
use crate::store::{Store, StoreError};

/// One study session as submitted by a client. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyRecord {
    pub id: String,
    pub user_id: String,
    pub word_count: u64,
    pub study_time_minutes: u64,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Idempotency key, unique per user.
    pub submission_id: String,
}

impl StudyRecord {
    fn storage_key(&self) -> String {
        keys::record_key(&self.user_id, self.timestamp, &self.id)
    }
}

fn from_transaction_error(error: TransactionError<StoreError>) -> StoreError {
    match error {
        TransactionError::Abort(store_error) => store_error,
        TransactionError::Storage(storage_error) => StoreError::Sled(storage_error),
    }
}

/// Result of [`Store::get_or_create_record`].
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub record: StudyRecord,
    pub created: bool,
}

impl Store {
    /// Inserts `record` unless a record with the same `(user_id, submission_id)`
    /// already exists, in which case the stored one is returned untouched.
    ///
    /// The existence check and both inserts run in one sled transaction over the
    /// records tree and the submission index, so two concurrent identical
    /// submissions can never both insert.
    pub fn get_or_create_record(&self, record: &StudyRecord) -> Result<StoredRecord, StoreError> {
        let record_key = record.storage_key();
        let submission_key = keys::submission_key(&record.user_id, &record.submission_id);
        let record_bytes = Self::serialize(record)?;

        let existing = (&self.records, &self.record_submissions)
            .transaction(|(tx_records, tx_submissions)| {
                if let Some(existing_key) = tx_submissions.get(submission_key.as_bytes())? {
                    if let Some(raw) = tx_records.get(existing_key.as_ref())? {
                        return Ok(Some(raw));
                    }
                    // 索引指向的记录已不存在，按新记录写入并覆盖索引
                }
                tx_records.insert(record_key.as_bytes(), record_bytes.as_slice())?;
                tx_submissions.insert(submission_key.as_bytes(), record_key.as_bytes())?;
                Ok::<_, ConflictableTransactionError<StoreError>>(None)
            })
            .map_err(from_transaction_error)?;

        match existing {
            Some(raw) => Ok(StoredRecord {
                record: Self::deserialize(&raw)?,
                created: false,
            }),
            None => Ok(StoredRecord {
                record: record.clone(),
                created: true,
            }),
        }
    }

    pub fn get_record_by_submission(
        &self,
        user_id: &str,
        submission_id: &str,
    ) -> Result<Option<StudyRecord>, StoreError> {
        let submission_key = keys::submission_key(user_id, submission_id);
        let Some(record_key) = self.record_submissions.get(submission_key.as_bytes())? else {
            return Ok(None);
        };
        match self.records.get(record_key)? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Records of `user_id` with `from <= timestamp <= to`, ascending by timestamp.
    pub fn list_user_records_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StudyRecord>, StoreError> {
        if from > to {
            return Ok(Vec::new());
        }
        let start = keys::record_range_start(user_id, from);
        let end = keys::record_range_end(user_id, to);

        let mut records = Vec::new();
        for item in self.records.range(start.as_bytes()..end.as_bytes()) {
            let (_, value) = item?;
            let record: StudyRecord = Self::deserialize(&value)?;
            // 键只到微秒，边界按完整时间戳再判一次
            if record.timestamp >= from && record.timestamp <= to {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub fn count_user_records(&self, user_id: &str) -> Result<usize, StoreError> {
        let prefix = keys::record_prefix(user_id);
        let mut count = 0usize;
        for item in self.records.scan_prefix(prefix.as_bytes()) {
            let _ = item?;
            count += 1;
        }
        Ok(count)
    }

    /// Administrative cleanup: removes every record of `user_id` together with
    /// its submission index entry, both trees in one transaction. Returns the
    /// number of records removed.
    pub fn delete_user_records(&self, user_id: &str) -> Result<usize, StoreError> {
        let prefix = keys::record_prefix(user_id);
        let mut record_batch = sled::Batch::default();
        let mut submission_batch = sled::Batch::default();
        let mut removed = 0usize;

        for item in self.records.scan_prefix(prefix.as_bytes()) {
            let (key, value) = item?;
            let record: StudyRecord = Self::deserialize(&value)?;
            submission_batch.remove(keys::submission_key(user_id, &record.submission_id).as_bytes());
            record_batch.remove(key);
            removed += 1;
        }

        (&self.records, &self.record_submissions)
            .transaction(|(tx_records, tx_submissions)| {
                tx_records.apply_batch(&record_batch)?;
                tx_submissions.apply_batch(&submission_batch)?;
                Ok::<_, ConflictableTransactionError<StoreError>>(())
            })
            .map_err(from_transaction_error)?;
        tracing::info!(user_id, removed, "Deleted user records");
        Ok(removed)
    }
}
