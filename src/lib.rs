pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::ports::{
    AssetResolver, ConnectivityProbe, MirrorStore, RemoteCollection, RemoteFilter, RemoteRecord,
};
pub use application::services::{MirrorService, SyncParticipant, SyncService, SyncStatusSnapshot};
pub use domain::entities::{
    Contratista, Contrato, Estimacion, MirrorFilter, MirrorRecord, MirroredEntity, MutationEvent,
    MutationKind, Obra, SweepReport, SweepSkip, SyncFailure, SyncFailureKind, SyncReport,
};
pub use domain::value_objects::{EntityId, SyncState};
pub use infrastructure::cache::MemoryAssetCache;
pub use infrastructure::connectivity::{ConnectivityFlag, HttpHealthProbe};
pub use infrastructure::database::{ConnectionPool, SqliteMirrorStore};
pub use infrastructure::remote::RestCollection;
pub use shared::config::{AppConfig, SyncConfig};
pub use shared::error::{AppError, Result};

/// Installs the global tracing subscriber. `RUST_LOG` wins when set,
/// otherwise the engine logs at `info`.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
