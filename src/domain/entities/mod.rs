pub mod mirror;
pub mod mutation_event;
pub mod records;
pub mod sync_report;

pub use mirror::{MirrorFilter, MirrorRecord, MirroredEntity};
pub use mutation_event::{MutationEvent, MutationKind};
pub use records::{Contratista, Contrato, Estimacion, Obra};
pub use sync_report::{SweepReport, SweepSkip, SyncFailure, SyncFailureKind, SyncReport};
