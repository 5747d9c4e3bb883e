use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::EntityId;

/// Kind of local mutation that was durably applied to the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Created,
    Updated,
    Deleted,
}

/// Notification published after every successful local write.
///
/// Subscribers (activity feeds, recent-items lists) consume these on their
/// own schedule; publishing never blocks or fails the write path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationEvent {
    pub collection: String,
    pub entity_id: EntityId,
    pub kind: MutationKind,
    pub occurred_at: DateTime<Utc>,
}

impl MutationEvent {
    pub fn new(collection: &str, entity_id: EntityId, kind: MutationKind) -> Self {
        Self {
            collection: collection.to_string(),
            entity_id,
            kind,
            occurred_at: Utc::now(),
        }
    }
}
