use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use crate::domain::entities::{MirrorRecord, MirroredEntity};
use crate::domain::value_objects::{EntityId, SyncState};
use crate::shared::error::AppError;

pub(super) fn map_mirror_row<T: MirrorRecord>(
    row: &SqliteRow,
) -> Result<MirroredEntity<T>, AppError> {
    let id: String = row.try_get("id")?;
    let payload: String = row.try_get("payload")?;
    let created_at: i64 = row.try_get("created_at")?;
    let updated_at: i64 = row.try_get("updated_at")?;
    let deleted_at: Option<i64> = row.try_get("deleted_at")?;
    let sync_state: String = row.try_get("sync_state")?;
    let last_sync: Option<i64> = row.try_get("last_sync")?;
    let sync_error: Option<String> = row.try_get("sync_error")?;

    let record: T = serde_json::from_str(&payload)?;
    let id = EntityId::new(id).map_err(AppError::Storage)?;
    let state = SyncState::parse(&sync_state).map_err(AppError::Storage)?;

    Ok(MirroredEntity {
        id,
        record,
        created_at: from_millis(created_at),
        updated_at: from_millis(updated_at),
        deleted_at: deleted_at.map(from_millis),
        state,
        last_sync: last_sync.map(from_millis),
        sync_error,
    })
}

pub(super) fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}

pub(super) fn to_millis(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}
