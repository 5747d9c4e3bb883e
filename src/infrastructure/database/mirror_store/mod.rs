mod mapper;
mod queries;

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::Row;

use crate::application::ports::MirrorStore;
use crate::domain::entities::{MirrorFilter, MirrorRecord, MirroredEntity};
use crate::domain::value_objects::EntityId;
use crate::infrastructure::database::connection_pool::ConnectionPool;
use crate::shared::error::Result;

use mapper::{map_mirror_row, to_millis};

/// SQLite-backed mirror. All collections share one table, partitioned by
/// the collection name; payloads travel as JSON text.
pub struct SqliteMirrorStore<T> {
    pool: ConnectionPool,
    _record: PhantomData<T>,
}

impl<T: MirrorRecord> SqliteMirrorStore<T> {
    pub fn new(pool: ConnectionPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<T: MirrorRecord> MirrorStore<T> for SqliteMirrorStore<T> {
    async fn put(&self, entity: &MirroredEntity<T>) -> Result<()> {
        let payload = serde_json::to_string(&entity.record)?;
        sqlx::query(queries::UPSERT_MIRROR_RECORD)
            .bind(T::COLLECTION)
            .bind(entity.id.as_str())
            .bind(payload)
            .bind(to_millis(entity.created_at))
            .bind(to_millis(entity.updated_at))
            .bind(entity.deleted_at.map(to_millis))
            .bind(entity.state.as_str())
            .bind(entity.last_sync.map(to_millis))
            .bind(entity.sync_error.as_deref())
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }

    async fn get(&self, id: &EntityId) -> Result<Option<MirroredEntity<T>>> {
        let row = sqlx::query(queries::SELECT_MIRROR_RECORD)
            .bind(T::COLLECTION)
            .bind(id.as_str())
            .fetch_optional(self.pool.get_pool())
            .await?;
        row.as_ref().map(map_mirror_row).transpose()
    }

    async fn bulk_put(&self, entities: &[MirroredEntity<T>]) -> Result<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.get_pool().begin().await?;
        for entity in entities {
            let payload = serde_json::to_string(&entity.record)?;
            sqlx::query(queries::REFRESH_MIRROR_RECORD)
                .bind(T::COLLECTION)
                .bind(entity.id.as_str())
                .bind(payload)
                .bind(to_millis(entity.created_at))
                .bind(to_millis(entity.updated_at))
                .bind(entity.deleted_at.map(to_millis))
                .bind(entity.state.as_str())
                .bind(entity.last_sync.map(to_millis))
                .bind(entity.sync_error.as_deref())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn query(&self, filter: &MirrorFilter) -> Result<Vec<MirroredEntity<T>>> {
        // Tombstoned rows are the only inactive ones and are never served.
        if filter.active == Some(false) {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(queries::SELECT_LIVE_RECORDS)
            .bind(T::COLLECTION)
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_mirror_row).collect()
    }

    async fn pending(&self) -> Result<Vec<MirroredEntity<T>>> {
        let rows = sqlx::query(queries::SELECT_PENDING_RECORDS)
            .bind(T::COLLECTION)
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_mirror_row).collect()
    }

    async fn count_pending(&self) -> Result<u64> {
        let row = sqlx::query(queries::COUNT_PENDING_RECORDS)
            .bind(T::COLLECTION)
            .fetch_one(self.pool.get_pool())
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count as u64)
    }

    async fn replace(&self, old_id: &EntityId, entity: &MirroredEntity<T>) -> Result<()> {
        let payload = serde_json::to_string(&entity.record)?;
        let mut tx = self.pool.get_pool().begin().await?;
        sqlx::query(queries::DELETE_MIRROR_RECORD)
            .bind(T::COLLECTION)
            .bind(old_id.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query(queries::UPSERT_MIRROR_RECORD)
            .bind(T::COLLECTION)
            .bind(entity.id.as_str())
            .bind(payload)
            .bind(to_millis(entity.created_at))
            .bind(to_millis(entity.updated_at))
            .bind(entity.deleted_at.map(to_millis))
            .bind(entity.state.as_str())
            .bind(entity.last_sync.map(to_millis))
            .bind(entity.sync_error.as_deref())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: &EntityId) -> Result<bool> {
        let result = sqlx::query(queries::DELETE_MIRROR_RECORD)
            .bind(T::COLLECTION)
            .bind(id.as_str())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_archived(&self, cutoff_ms: i64) -> Result<u64> {
        let result = sqlx::query(queries::PURGE_ARCHIVED_RECORDS)
            .bind(T::COLLECTION)
            .bind(cutoff_ms)
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected())
    }
}
