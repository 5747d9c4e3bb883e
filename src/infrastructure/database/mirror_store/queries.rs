pub(super) const UPSERT_MIRROR_RECORD: &str = r#"
    INSERT INTO mirror_records (
        collection, id, payload, created_at, updated_at,
        deleted_at, sync_state, last_sync, sync_error
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT(collection, id) DO UPDATE SET
        payload = excluded.payload,
        created_at = excluded.created_at,
        updated_at = excluded.updated_at,
        deleted_at = excluded.deleted_at,
        sync_state = excluded.sync_state,
        last_sync = excluded.last_sync,
        sync_error = excluded.sync_error
"#;

// Same upsert, but rows holding unsettled local changes win over the
// incoming remote copy. Used when refreshing the mirror from a fetch.
pub(super) const REFRESH_MIRROR_RECORD: &str = r#"
    INSERT INTO mirror_records (
        collection, id, payload, created_at, updated_at,
        deleted_at, sync_state, last_sync, sync_error
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT(collection, id) DO UPDATE SET
        payload = excluded.payload,
        created_at = excluded.created_at,
        updated_at = excluded.updated_at,
        deleted_at = excluded.deleted_at,
        sync_state = excluded.sync_state,
        last_sync = excluded.last_sync,
        sync_error = excluded.sync_error
    WHERE mirror_records.sync_state IN ('synced', 'archived')
"#;

pub(super) const SELECT_MIRROR_RECORD: &str = r#"
    SELECT collection, id, payload, created_at, updated_at,
           deleted_at, sync_state, last_sync, sync_error
    FROM mirror_records
    WHERE collection = ?1 AND id = ?2
"#;

pub(super) const SELECT_LIVE_RECORDS: &str = r#"
    SELECT collection, id, payload, created_at, updated_at,
           deleted_at, sync_state, last_sync, sync_error
    FROM mirror_records
    WHERE collection = ?1
      AND sync_state NOT IN ('pending_delete', 'archived')
    ORDER BY updated_at DESC, id DESC
"#;

pub(super) const SELECT_PENDING_RECORDS: &str = r#"
    SELECT collection, id, payload, created_at, updated_at,
           deleted_at, sync_state, last_sync, sync_error
    FROM mirror_records
    WHERE collection = ?1
      AND sync_state IN ('pending_create', 'pending_update', 'pending_delete')
    ORDER BY updated_at ASC, id ASC
"#;

pub(super) const COUNT_PENDING_RECORDS: &str = r#"
    SELECT COUNT(*) AS count
    FROM mirror_records
    WHERE collection = ?1
      AND sync_state IN ('pending_create', 'pending_update', 'pending_delete')
"#;

pub(super) const DELETE_MIRROR_RECORD: &str = r#"
    DELETE FROM mirror_records
    WHERE collection = ?1 AND id = ?2
"#;

pub(super) const PURGE_ARCHIVED_RECORDS: &str = r#"
    DELETE FROM mirror_records
    WHERE collection = ?1
      AND sync_state = 'archived'
      AND COALESCE(deleted_at, updated_at) < ?2
"#;
