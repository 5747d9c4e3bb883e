pub mod asset_resolver;
pub mod connectivity;
pub mod mirror_store;
pub mod remote_collection;

pub use asset_resolver::AssetResolver;
pub use connectivity::ConnectivityProbe;
pub use mirror_store::MirrorStore;
pub use remote_collection::{RemoteCollection, RemoteFilter, RemoteRecord};
