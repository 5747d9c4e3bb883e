use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::ports::ConnectivityProbe;
use crate::domain::entities::{SweepReport, SweepSkip, SyncReport};
use crate::shared::config::SyncConfig;
use crate::shared::error::Result;

/// One collection taking part in the cross-collection sweep.
#[async_trait]
pub trait SyncParticipant: Send + Sync {
    fn collection(&self) -> &'static str;
    async fn sync_pending(&self) -> Result<SyncReport>;
    async fn pending_count(&self) -> Result<u64>;
}

/// Point-in-time view of the reconciliation machinery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatusSnapshot {
    pub is_syncing: bool,
    pub last_sync: Option<DateTime<Utc>>,
    /// Pending record counts keyed by collection name.
    pub pending: BTreeMap<String, u64>,
    /// Collection sweeps aborted by a local error since startup.
    pub sync_errors: u32,
}

#[derive(Debug, Clone, Default)]
struct SweepState {
    is_syncing: bool,
    last_sync: Option<DateTime<Utc>>,
    sync_errors: u32,
}

/// Drives reconciliation across every registered collection.
///
/// Sweeps are serialized: a second request while one is running is
/// answered with a skipped report instead of queueing. Participants run in
/// registration order, so parents (obras) should be registered before the
/// collections that reference them.
pub struct SyncService {
    probe: Arc<dyn ConnectivityProbe>,
    participants: Vec<Arc<dyn SyncParticipant>>,
    state: Arc<RwLock<SweepState>>,
}

impl SyncService {
    pub fn new(probe: Arc<dyn ConnectivityProbe>) -> Self {
        Self {
            probe,
            participants: Vec::new(),
            state: Arc::new(RwLock::new(SweepState::default())),
        }
    }

    /// Registers a collection. Call before the service is shared.
    pub fn register(&mut self, participant: Arc<dyn SyncParticipant>) {
        self.participants.push(participant);
    }

    /// Runs one sweep over every registered collection and reports per
    /// collection. Offline, the sweep is skipped without touching anything.
    pub async fn sync_pending(&self) -> SweepReport {
        {
            let mut state = self.state.write().await;
            if state.is_syncing {
                return SweepReport::skipped(SweepSkip::AlreadyRunning);
            }
            state.is_syncing = true;
        }

        let report = self.run_sweep().await;

        let mut state = self.state.write().await;
        state.is_syncing = false;
        if report.skipped.is_none() {
            state.last_sync = Some(Utc::now());
            state.sync_errors = state.sync_errors.saturating_add(report.errors.len() as u32);
        }
        report
    }

    /// Snapshot of sweep state plus live pending counts per collection.
    pub async fn status(&self) -> Result<SyncStatusSnapshot> {
        let state = self.state.read().await.clone();
        let mut pending = BTreeMap::new();
        for participant in &self.participants {
            pending.insert(
                participant.collection().to_string(),
                participant.pending_count().await?,
            );
        }
        Ok(SyncStatusSnapshot {
            is_syncing: state.is_syncing,
            last_sync: state.last_sync,
            pending,
            sync_errors: state.sync_errors,
        })
    }

    /// Spawns the periodic sweep when the config enables it.
    pub fn schedule_from(&self, config: &SyncConfig) -> Option<tokio::task::JoinHandle<()>> {
        if !config.auto_sync {
            tracing::debug!(target: "sync::service", "auto sync disabled, no sweep scheduled");
            return None;
        }
        Some(self.schedule(config.sync_interval))
    }

    /// Spawns a periodic sweep. The first tick fires immediately.
    pub fn schedule(&self, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_secs.max(1)));

            loop {
                interval.tick().await;

                let report = service.sync_pending().await;
                if !report.errors.is_empty() {
                    tracing::warn!(
                        target: "sync::service",
                        errors = report.errors.len(),
                        "scheduled sweep finished with collection failures"
                    );
                }
            }
        })
    }

    async fn run_sweep(&self) -> SweepReport {
        if !self.probe.is_online().await {
            tracing::debug!(target: "sync::service", "probe reports offline, skipping sweep");
            return SweepReport::skipped(SweepSkip::Offline);
        }

        let mut report = SweepReport::default();
        for participant in &self.participants {
            let collection = participant.collection();
            match participant.sync_pending().await {
                Ok(collection_report) => {
                    report
                        .collections
                        .insert(collection.to_string(), collection_report);
                }
                // One broken collection must not stop the others.
                Err(err) => {
                    tracing::error!(
                        target: "sync::service",
                        collection,
                        error = %err,
                        "collection sweep failed"
                    );
                    report.errors.insert(collection.to_string(), err.to_string());
                }
            }
        }

        tracing::info!(
            target: "sync::service",
            collections = report.collections.len(),
            synced = report.synced_count(),
            failed = report.failed_count(),
            rejected = report.rejected_count(),
            "sweep finished"
        );
        report
    }
}

impl Clone for SyncService {
    fn clone(&self) -> Self {
        Self {
            probe: self.probe.clone(),
            participants: self.participants.clone(),
            state: self.state.clone(),
        }
    }
}
