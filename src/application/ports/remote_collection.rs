use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{MirrorRecord, MirroredEntity};
use crate::domain::value_objects::{EntityId, SyncState};
use crate::shared::error::{AppError, Result};

/// A record as the backend sees it: payload fields flattened next to the
/// identity, timestamps and soft-delete flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord<T> {
    pub id: String,
    #[serde(flatten)]
    pub record: T,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl<T: MirrorRecord> RemoteRecord<T> {
    /// Projects a mirrored record onto the wire shape.
    pub fn from_entity(entity: &MirroredEntity<T>) -> Self {
        let tombstoned = entity.state.is_tombstoned();
        Self {
            id: entity.id.to_string(),
            record: entity.record.clone(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            active: !tombstoned,
            deleted: tombstoned,
            deleted_at: entity.deleted_at,
        }
    }

    /// Adopts a canonical remote record into the mirror, stamped as agreed
    /// upon at `now`. Remote soft-deletes land as local tombstones.
    pub fn into_entity(self, now: DateTime<Utc>) -> Result<MirroredEntity<T>> {
        let id = EntityId::new(self.id).map_err(AppError::Serialization)?;
        let state = if self.deleted || !self.active {
            SyncState::Archived
        } else {
            SyncState::Synced
        };
        Ok(MirroredEntity {
            id,
            record: self.record,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
            state,
            last_sync: Some(now),
            sync_error: None,
        })
    }
}

/// Server-side listing filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteFilter {
    pub active: Option<bool>,
    pub deleted: Option<bool>,
}

/// One collection of the remote backend.
///
/// Implementations translate failures into the engine's error taxonomy:
/// transport problems and server-side faults become `AppError::Offline`,
/// validation refusals become `AppError::Rejected` with the server's reason.
#[async_trait]
pub trait RemoteCollection<T>: Send + Sync
where
    T: MirrorRecord,
{
    async fn list(&self, filter: &RemoteFilter) -> Result<Vec<RemoteRecord<T>>>;

    /// Inserts a record. The server may honor the client-supplied id or
    /// mint its own; the returned canonical record is authoritative.
    async fn insert(&self, record: &RemoteRecord<T>) -> Result<RemoteRecord<T>>;

    async fn update(&self, id: &EntityId, record: &RemoteRecord<T>) -> Result<RemoteRecord<T>>;

    /// Marks a record deleted without destroying it server-side.
    async fn soft_delete(&self, id: &EntityId) -> Result<()>;
}
