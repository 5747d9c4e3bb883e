pub mod entity_id;
pub mod sync_state;

pub use entity_id::EntityId;
pub use sync_state::SyncState;
