use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::value_objects::{EntityId, SyncState};

/// Contract every mirrored payload type implements.
///
/// A payload is plain business data; the surrounding [`MirroredEntity`]
/// carries identity, timestamps and the sync lifecycle. Types with
/// secondary assets (stored under an object key, served via a resolved URL)
/// override the two asset hooks.
pub trait MirrorRecord:
    Clone + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Remote collection name, also the partition key in the local store.
    const COLLECTION: &'static str;

    /// Storage keys of secondary assets referenced by this payload.
    fn asset_refs(&self) -> Vec<String> {
        Vec::new()
    }

    /// Attaches a resolved URL for one of the keys from [`Self::asset_refs`].
    fn apply_asset_url(&mut self, _reference: &str, _url: String) {}
}

/// A record as held in the local mirror: payload plus sync envelope.
///
/// The `MirrorRecord` bound already supplies serde for `T`; the derive must
/// not add its own `Deserialize` bound on top or the two become ambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct MirroredEntity<T: MirrorRecord> {
    pub id: EntityId,
    pub record: T,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub state: SyncState,
    /// Instant of the last confirmed agreement with the remote.
    pub last_sync: Option<DateTime<Utc>>,
    /// Reason the remote refused this record, set while quarantined.
    pub sync_error: Option<String>,
}

impl<T: MirrorRecord> MirroredEntity<T> {
    /// Wraps a freshly created payload with a provisional id.
    pub fn new_local(record: T, now: DateTime<Utc>) -> Self {
        Self {
            id: EntityId::generate(),
            record,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            state: SyncState::PendingCreate,
            last_sync: None,
            sync_error: None,
        }
    }

    /// Applies a local edit and requeues the record for the sweeper.
    ///
    /// A record the remote never acknowledged stays `PendingCreate` so the
    /// sweeper replays it as an insert, not as an update of a foreign id.
    pub fn apply_update(&mut self, record: T, now: DateTime<Utc>) {
        self.record = record;
        self.updated_at = now;
        self.deleted_at = None;
        self.sync_error = None;
        self.state = if self.last_sync.is_none() {
            SyncState::PendingCreate
        } else {
            SyncState::PendingUpdate
        };
    }

    /// Marks the record as locally deleted; the row stays as a tombstone.
    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.updated_at = now;
        self.sync_error = None;
        self.state = SyncState::PendingDelete;
    }

    /// Settles a deletion, remotely acknowledged or resolved locally.
    pub fn mark_archived(&mut self, now: DateTime<Utc>) {
        self.state = SyncState::Archived;
        self.last_sync = Some(now);
        if self.deleted_at.is_none() {
            self.deleted_at = Some(now);
        }
    }

    /// Quarantines the record after a remote validation rejection.
    pub fn mark_rejected(&mut self, reason: String) {
        self.state = SyncState::Rejected;
        self.sync_error = Some(reason);
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    pub fn is_tombstoned(&self) -> bool {
        self.state.is_tombstoned()
    }
}

/// Consumer-facing read filter, honored identically online and offline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorFilter {
    /// `Some(true)` keeps only live records, which is also what an empty
    /// filter serves; `Some(false)` asks for archived records, which the
    /// mirror never exposes to consumers.
    pub active: Option<bool>,
}

impl MirrorFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn active_only() -> Self {
        Self { active: Some(true) }
    }
}
