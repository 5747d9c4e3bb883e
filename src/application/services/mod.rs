pub mod mirror_service;
pub mod sync_service;

pub use mirror_service::MirrorService;
pub use sync_service::{SyncParticipant, SyncService, SyncStatusSnapshot};
