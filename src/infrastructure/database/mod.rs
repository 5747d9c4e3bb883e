pub mod connection_pool;
pub mod mirror_store;

pub use connection_pool::ConnectionPool;
pub use mirror_store::SqliteMirrorStore;
