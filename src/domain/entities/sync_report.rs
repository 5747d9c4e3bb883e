use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a pending record could not be confirmed during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncFailureKind {
    /// Transient: the remote was unreachable, the record stays pending.
    Connectivity,
    /// Permanent until edited: the remote refused the record.
    Rejection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub entity_id: String,
    pub kind: SyncFailureKind,
    pub message: String,
}

/// Outcome of one collection's reconciliation sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Records confirmed by the remote during this sweep.
    pub synced_count: u32,
    /// Records that stayed pending because the remote was unreachable.
    pub failed_count: u32,
    /// Records the remote refused; now quarantined.
    pub rejected_count: u32,
    /// Records still pending after the sweep finished.
    pub pending_count: u32,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed_count == 0 && self.rejected_count == 0
    }
}

/// Why a whole sweep was skipped without touching any collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepSkip {
    Offline,
    AlreadyRunning,
}

/// Outcome of one cross-collection sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Set when the sweep did not run at all.
    pub skipped: Option<SweepSkip>,
    /// Per-collection reports, keyed by collection name.
    pub collections: BTreeMap<String, SyncReport>,
    /// Collections whose sweep aborted with a local error.
    pub errors: BTreeMap<String, String>,
}

impl SweepReport {
    pub fn skipped(reason: SweepSkip) -> Self {
        Self {
            skipped: Some(reason),
            ..Default::default()
        }
    }

    pub fn synced_count(&self) -> u32 {
        self.collections.values().map(|r| r.synced_count).sum()
    }

    pub fn failed_count(&self) -> u32 {
        self.collections.values().map(|r| r.failed_count).sum()
    }

    pub fn rejected_count(&self) -> u32 {
        self.collections.values().map(|r| r.rejected_count).sum()
    }

    pub fn pending_count(&self) -> u32 {
        self.collections.values().map(|r| r.pending_count).sum()
    }
}
