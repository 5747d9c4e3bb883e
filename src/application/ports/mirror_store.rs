use async_trait::async_trait;

use crate::domain::entities::{MirrorFilter, MirrorRecord, MirroredEntity};
use crate::domain::value_objects::EntityId;
use crate::shared::error::Result;

/// Durable local mirror for one collection.
///
/// Every write must be durable before the call returns; the engine treats a
/// successful `put` as permission to tell the caller the mutation happened.
/// Tombstoned rows are stored like any other row, visibility filtering is
/// the contract of `query`, not of `get`.
#[async_trait]
pub trait MirrorStore<T>: Send + Sync
where
    T: MirrorRecord,
{
    /// Inserts or fully overwrites one record.
    async fn put(&self, entity: &MirroredEntity<T>) -> Result<()>;

    /// Fetches one record by id, tombstones included.
    async fn get(&self, id: &EntityId) -> Result<Option<MirroredEntity<T>>>;

    /// Upserts a batch atomically; used to refresh the mirror from a remote
    /// fetch. Rows currently holding unsettled local changes (pending or
    /// quarantined) keep their local copy.
    async fn bulk_put(&self, entities: &[MirroredEntity<T>]) -> Result<()>;

    /// Consumer read: live records matching the filter, newest first.
    async fn query(&self, filter: &MirrorFilter) -> Result<Vec<MirroredEntity<T>>>;

    /// Records carrying a pending intent, oldest edit first.
    async fn pending(&self) -> Result<Vec<MirroredEntity<T>>>;

    async fn count_pending(&self) -> Result<u64>;

    /// Atomically swaps a record's id, used when the remote mints its own
    /// id for a locally created record.
    async fn replace(&self, old_id: &EntityId, entity: &MirroredEntity<T>) -> Result<()>;

    /// Physically removes one row. Reconciliation never calls this; it
    /// exists for maintenance alongside [`Self::purge_archived`].
    async fn delete(&self, id: &EntityId) -> Result<bool>;

    /// Drops archived tombstones older than `cutoff_ms` (epoch millis).
    async fn purge_archived(&self, cutoff_ms: i64) -> Result<u64>;
}
