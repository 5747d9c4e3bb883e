use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a mirrored record with respect to the remote backend.
///
/// The state is persisted with the record and replaces any guessing from
/// timestamps: a record is dirty exactly when it carries a `Pending*` state,
/// and tombstoned exactly when it is `PendingDelete` or `Archived`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Local copy matches the remote as of `last_sync`.
    Synced,
    /// Created locally, never acknowledged by the remote.
    PendingCreate,
    /// Edited locally since the last acknowledgement.
    PendingUpdate,
    /// Deleted locally, deletion not yet acknowledged.
    PendingDelete,
    /// Soft-deleted and settled; kept as a tombstone.
    Archived,
    /// The remote refused the record; quarantined until edited again.
    Rejected,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Synced => "synced",
            SyncState::PendingCreate => "pending_create",
            SyncState::PendingUpdate => "pending_update",
            SyncState::PendingDelete => "pending_delete",
            SyncState::Archived => "archived",
            SyncState::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "synced" => Ok(SyncState::Synced),
            "pending_create" => Ok(SyncState::PendingCreate),
            "pending_update" => Ok(SyncState::PendingUpdate),
            "pending_delete" => Ok(SyncState::PendingDelete),
            "archived" => Ok(SyncState::Archived),
            "rejected" => Ok(SyncState::Rejected),
            other => Err(format!("unknown sync state: {other}")),
        }
    }

    /// True when the record carries an intent the sweeper must replay.
    pub fn is_dirty(&self) -> bool {
        matches!(
            self,
            SyncState::PendingCreate | SyncState::PendingUpdate | SyncState::PendingDelete
        )
    }

    /// True when the record must be hidden from consumer reads.
    pub fn is_tombstoned(&self) -> bool {
        matches!(self, SyncState::PendingDelete | SyncState::Archived)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
