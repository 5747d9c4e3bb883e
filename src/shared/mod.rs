pub mod config;
pub mod error;

pub use config::{AppConfig, CacheConfig, DatabaseConfig, RemoteConfig, SyncConfig};
pub use error::{AppError, Result};
