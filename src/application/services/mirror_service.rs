use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex};

use crate::application::ports::{
    AssetResolver, ConnectivityProbe, MirrorStore, RemoteCollection, RemoteFilter, RemoteRecord,
};
use crate::application::services::sync_service::SyncParticipant;
use crate::domain::entities::{
    MirrorFilter, MirrorRecord, MirroredEntity, MutationEvent, MutationKind, SyncFailure,
    SyncFailureKind, SyncReport,
};
use crate::domain::value_objects::{EntityId, SyncState};
use crate::shared::error::{AppError, Result};

const MUTATION_CHANNEL_CAPACITY: usize = 64;

/// How one remote push ended. Storage failures are not an outcome, they
/// abort the operation.
enum PushOutcome<T: MirrorRecord> {
    /// The remote confirmed; the mirror now holds the canonical copy.
    Confirmed(MirroredEntity<T>),
    /// The remote refused; the record is quarantined.
    Rejected {
        entity: MirroredEntity<T>,
        reason: String,
    },
    /// The remote was unreachable; the record stays pending.
    Unreachable {
        entity: MirroredEntity<T>,
        reason: String,
    },
}

/// Offline-first facade over one mirrored collection.
///
/// Every mutation lands durably in the local mirror before anything else
/// happens; remote propagation is immediate when the probe says online and
/// deferred to [`MirrorService::sync_pending`] otherwise. Reads prefer fresh
/// remote data but always serve, remote failures never surface to callers.
pub struct MirrorService<T: MirrorRecord> {
    store: Arc<dyn MirrorStore<T>>,
    remote: Arc<dyn RemoteCollection<T>>,
    probe: Arc<dyn ConnectivityProbe>,
    assets: Option<Arc<dyn AssetResolver>>,
    events: broadcast::Sender<MutationEvent>,
    // Sweeps for this collection run one at a time.
    sweep_gate: Mutex<()>,
}

impl<T: MirrorRecord> MirrorService<T> {
    pub fn new(
        store: Arc<dyn MirrorStore<T>>,
        remote: Arc<dyn RemoteCollection<T>>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        let (events, _) = broadcast::channel(MUTATION_CHANNEL_CAPACITY);
        Self {
            store,
            remote,
            probe,
            assets: None,
            events,
            sweep_gate: Mutex::new(()),
        }
    }

    pub fn with_assets(mut self, resolver: Arc<dyn AssetResolver>) -> Self {
        self.assets = Some(resolver);
        self
    }

    /// Subscribes to mutation notifications for this collection.
    pub fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.events.subscribe()
    }

    /// Lists live records, refreshing the mirror from the remote first when
    /// online. Never fails on remote trouble, only on local storage errors.
    pub async fn fetch(&self, filter: MirrorFilter) -> Result<Vec<MirroredEntity<T>>> {
        if self.probe.is_online().await {
            let remote_filter = RemoteFilter {
                active: filter.active,
                deleted: None,
            };
            match self.remote.list(&remote_filter).await {
                Ok(records) => self.refresh_mirror(records).await?,
                Err(err) => {
                    tracing::warn!(
                        target: "mirror::read",
                        collection = T::COLLECTION,
                        error = %err,
                        "remote list failed, serving mirror"
                    );
                }
            }
        }

        let mut entities = self.store.query(&filter).await?;
        self.enrich(&mut entities).await;
        Ok(entities)
    }

    /// Reads one record from the mirror. Tombstoned records read as absent.
    pub async fn get(&self, id: &EntityId) -> Result<Option<MirroredEntity<T>>> {
        let Some(mut entity) = self.store.get(id).await? else {
            return Ok(None);
        };
        if entity.is_tombstoned() {
            return Ok(None);
        }
        self.enrich(std::slice::from_mut(&mut entity)).await;
        Ok(Some(entity))
    }

    /// Creates a record. The write is durable before any network is tried;
    /// the returned envelope tells the caller how far propagation got.
    pub async fn create(&self, record: T) -> Result<MirroredEntity<T>> {
        let entity = MirroredEntity::new_local(record, Utc::now());
        self.store.put(&entity).await?;
        tracing::debug!(
            target: "mirror::write",
            collection = T::COLLECTION,
            id = %entity.id,
            "record created locally"
        );
        self.publish(MutationKind::Created, entity.id.clone());

        if !self.probe.is_online().await {
            return Ok(entity);
        }
        match self.push_entity(entity).await? {
            PushOutcome::Confirmed(entity)
            | PushOutcome::Rejected { entity, .. }
            | PushOutcome::Unreachable { entity, .. } => Ok(entity),
        }
    }

    /// Applies an edit to a live record and requeues it for propagation.
    pub async fn update(&self, id: &EntityId, record: T) -> Result<MirroredEntity<T>> {
        let Some(mut entity) = self.store.get(id).await? else {
            return Err(AppError::NotFound(format!("{} {id}", T::COLLECTION)));
        };
        if entity.is_tombstoned() {
            return Err(AppError::NotFound(format!("{} {id}", T::COLLECTION)));
        }

        entity.apply_update(record, Utc::now());
        self.store.put(&entity).await?;
        self.publish(MutationKind::Updated, entity.id.clone());

        if !self.probe.is_online().await {
            return Ok(entity);
        }
        match self.push_entity(entity).await? {
            PushOutcome::Confirmed(entity)
            | PushOutcome::Rejected { entity, .. }
            | PushOutcome::Unreachable { entity, .. } => Ok(entity),
        }
    }

    /// Soft-deletes a record. The tombstone stays in the mirror; deleting an
    /// already tombstoned or missing record is a no-op only when tombstoned.
    pub async fn delete(&self, id: &EntityId) -> Result<()> {
        let Some(mut entity) = self.store.get(id).await? else {
            return Err(AppError::NotFound(format!("{} {id}", T::COLLECTION)));
        };
        if entity.is_tombstoned() {
            return Ok(());
        }

        entity.mark_deleted(Utc::now());
        self.store.put(&entity).await?;
        self.publish(MutationKind::Deleted, entity.id.clone());

        if self.probe.is_online().await {
            self.push_entity(entity).await?;
        }
        Ok(())
    }

    /// Replays every pending record against the remote, one at a time, and
    /// reports the outcome. A failing record never blocks the rest.
    pub async fn sync_pending(&self) -> Result<SyncReport> {
        let _guard = self.sweep_gate.lock().await;

        let pending = self.store.pending().await?;
        let mut report = SyncReport::default();
        for entity in pending {
            let entity_id = entity.id.to_string();
            match self.push_entity(entity).await? {
                PushOutcome::Confirmed(_) => report.synced_count += 1,
                PushOutcome::Rejected { reason, .. } => {
                    report.rejected_count += 1;
                    report.failures.push(SyncFailure {
                        entity_id,
                        kind: SyncFailureKind::Rejection,
                        message: reason,
                    });
                }
                PushOutcome::Unreachable { reason, .. } => {
                    report.failed_count += 1;
                    report.failures.push(SyncFailure {
                        entity_id,
                        kind: SyncFailureKind::Connectivity,
                        message: reason,
                    });
                }
            }
        }
        report.pending_count = self.store.count_pending().await? as u32;

        tracing::info!(
            target: "mirror::sweep",
            collection = T::COLLECTION,
            synced = report.synced_count,
            failed = report.failed_count,
            rejected = report.rejected_count,
            pending = report.pending_count,
            "sweep finished"
        );
        Ok(report)
    }

    /// Drops archived tombstones older than the cutoff (epoch millis).
    pub async fn purge_archived(&self, cutoff_ms: i64) -> Result<u64> {
        self.store.purge_archived(cutoff_ms).await
    }

    /// Replays one record's pending intent against the remote and settles
    /// the mirror accordingly. Shared by the immediate write paths and the
    /// sweeper so both classify outcomes the same way.
    async fn push_entity(&self, entity: MirroredEntity<T>) -> Result<PushOutcome<T>> {
        let now = Utc::now();
        match entity.state {
            SyncState::PendingCreate => self.push_insert(entity, now).await,
            SyncState::PendingUpdate => self.push_update(entity, now).await,
            SyncState::PendingDelete => self.push_delete(entity, now).await,
            // Settled and quarantined records carry no intent to replay.
            _ => Ok(PushOutcome::Confirmed(entity)),
        }
    }

    async fn push_insert(
        &self,
        entity: MirroredEntity<T>,
        now: DateTime<Utc>,
    ) -> Result<PushOutcome<T>> {
        match self.remote.insert(&RemoteRecord::from_entity(&entity)).await {
            Ok(canonical) => match canonical.into_entity(now) {
                Ok(clean) => {
                    // El servidor puede acuñar su propio id.
                    if clean.id == entity.id {
                        self.store.put(&clean).await?;
                    } else {
                        self.store.replace(&entity.id, &clean).await?;
                        tracing::debug!(
                            target: "mirror::sweep",
                            collection = T::COLLECTION,
                            provisional = %entity.id,
                            canonical = %clean.id,
                            "adopted server-minted id"
                        );
                    }
                    Ok(PushOutcome::Confirmed(clean))
                }
                Err(err) => Ok(self.defer(entity, err)),
            },
            Err(AppError::Rejected(reason)) => self.quarantine(entity, reason).await,
            Err(err) => Ok(self.defer(entity, err)),
        }
    }

    async fn push_update(
        &self,
        entity: MirroredEntity<T>,
        now: DateTime<Utc>,
    ) -> Result<PushOutcome<T>> {
        let wire = RemoteRecord::from_entity(&entity);
        match self.remote.update(&entity.id, &wire).await {
            Ok(canonical) => match canonical.into_entity(now) {
                Ok(clean) => {
                    self.store.put(&clean).await?;
                    Ok(PushOutcome::Confirmed(clean))
                }
                Err(err) => Ok(self.defer(entity, err)),
            },
            Err(AppError::Rejected(reason)) => self.quarantine(entity, reason).await,
            Err(err) => Ok(self.defer(entity, err)),
        }
    }

    async fn push_delete(
        &self,
        mut entity: MirroredEntity<T>,
        now: DateTime<Utc>,
    ) -> Result<PushOutcome<T>> {
        // Nothing to delete remotely for a record the remote never saw.
        if entity.last_sync.is_none() {
            entity.mark_archived(now);
            self.store.put(&entity).await?;
            return Ok(PushOutcome::Confirmed(entity));
        }
        match self.remote.soft_delete(&entity.id).await {
            Ok(()) => {
                entity.mark_archived(now);
                self.store.put(&entity).await?;
                Ok(PushOutcome::Confirmed(entity))
            }
            Err(AppError::Rejected(reason)) => self.quarantine(entity, reason).await,
            Err(err) => Ok(self.defer(entity, err)),
        }
    }

    async fn quarantine(
        &self,
        mut entity: MirroredEntity<T>,
        reason: String,
    ) -> Result<PushOutcome<T>> {
        tracing::warn!(
            target: "mirror::sweep",
            collection = T::COLLECTION,
            id = %entity.id,
            reason = %reason,
            "remote rejected record, quarantining"
        );
        entity.mark_rejected(reason.clone());
        self.store.put(&entity).await?;
        Ok(PushOutcome::Rejected { entity, reason })
    }

    fn defer(&self, entity: MirroredEntity<T>, err: AppError) -> PushOutcome<T> {
        tracing::debug!(
            target: "mirror::sweep",
            collection = T::COLLECTION,
            id = %entity.id,
            error = %err,
            "remote unreachable, record stays pending"
        );
        PushOutcome::Unreachable {
            entity,
            reason: err.to_string(),
        }
    }

    /// Adopts fresh remote records into the mirror. Rows holding unsettled
    /// local changes keep their local copy until the sweeper resolves them.
    async fn refresh_mirror(&self, records: Vec<RemoteRecord<T>>) -> Result<()> {
        let now = Utc::now();
        let mut refreshed = Vec::with_capacity(records.len());
        for record in records {
            match record.into_entity(now) {
                Ok(entity) => refreshed.push(entity),
                Err(err) => {
                    tracing::warn!(
                        target: "mirror::read",
                        collection = T::COLLECTION,
                        error = %err,
                        "skipping malformed remote record"
                    );
                }
            }
        }
        self.store.bulk_put(&refreshed).await
    }

    /// Best-effort asset URL resolution; records without assets pass through.
    async fn enrich(&self, entities: &mut [MirroredEntity<T>]) {
        let Some(resolver) = &self.assets else {
            return;
        };
        for entity in entities.iter_mut() {
            for reference in entity.record.asset_refs() {
                if let Some(url) = resolver.resolve_url(&reference).await {
                    entity.record.apply_asset_url(&reference, url);
                }
            }
        }
    }

    fn publish(&self, kind: MutationKind, entity_id: EntityId) {
        // Nadie suscrito no es un error.
        let _ = self
            .events
            .send(MutationEvent::new(T::COLLECTION, entity_id, kind));
    }
}

#[async_trait]
impl<T: MirrorRecord> SyncParticipant for MirrorService<T> {
    fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    async fn sync_pending(&self) -> Result<SyncReport> {
        MirrorService::sync_pending(self).await
    }

    async fn pending_count(&self) -> Result<u64> {
        self.store.count_pending().await
    }
}
