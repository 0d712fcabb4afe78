use crate::store::keys;
use crate::store::operations::records::StudyRecord;
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_record_submission_index", m002_record_submission_index),
    ]
}

/// 执行所有未应用的迁移。
///
/// 每个迁移必须幂等：进程可能在迁移成功后、写入版本号之前崩溃，重启后会重跑该迁移。
/// 版本号只允许前进。
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;

    for (index, (name, func)) in migrations().iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.config_versions.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: format!("corrupt version marker ({} bytes)", raw.len()),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .config_versions
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

fn m002_record_submission_index(store: &Store) -> Result<(), StoreError> {
    let mut rebuilt = 0usize;
    for item in store.records.iter() {
        let (record_key, value) = item?;
        let record: StudyRecord = Store::deserialize(&value)?;
        let submission_key = keys::submission_key(&record.user_id, &record.submission_id);
        store
            .record_submissions
            .insert(submission_key.as_bytes(), record_key)?;
        rebuilt += 1;
    }
    tracing::debug!(rebuilt, "Submission index rebuilt");
    Ok(())
}
