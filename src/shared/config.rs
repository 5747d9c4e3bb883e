use serde::{Deserialize, Serialize};

/// Runtime configuration for the mirror engine.
///
/// Defaults are suitable for local development; every field can be
/// overridden through `OBRA_`-prefixed environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL, e.g. `sqlite:data/obra_sync.db`.
    pub url: String,
    pub max_connections: u32,
    /// Seconds to wait for a connection from the pool.
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the backend API, without a trailing slash.
    pub base_url: String,
    /// Optional bearer token attached to every remote call.
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Whether the periodic reconciliation sweep is scheduled at startup.
    pub auto_sync: bool,
    /// Seconds between scheduled sweeps.
    pub sync_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a resolved asset URL stays usable before it is re-resolved.
    pub asset_ttl: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/obra_sync.db".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            remote: RemoteConfig {
                base_url: "http://localhost:8080/api".to_string(),
                bearer_token: None,
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 300,
            },
            cache: CacheConfig { asset_ttl: 600 },
        }
    }
}

impl AppConfig {
    /// Builds a config from defaults plus `OBRA_*` environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("OBRA_DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(value) = std::env::var("OBRA_DATABASE_MAX_CONNECTIONS") {
            if let Some(parsed) = parse_u32(&value) {
                config.database.max_connections = parsed;
            }
        }
        if let Ok(value) = std::env::var("OBRA_DATABASE_TIMEOUT") {
            if let Some(parsed) = parse_u64(&value) {
                config.database.connection_timeout = parsed;
            }
        }
        if let Ok(url) = std::env::var("OBRA_REMOTE_URL") {
            config.remote.base_url = url;
        }
        if let Ok(token) = std::env::var("OBRA_REMOTE_TOKEN") {
            if !token.is_empty() {
                config.remote.bearer_token = Some(token);
            }
        }
        if let Ok(value) = std::env::var("OBRA_AUTO_SYNC") {
            if let Some(parsed) = parse_bool(&value) {
                config.sync.auto_sync = parsed;
            }
        }
        if let Ok(value) = std::env::var("OBRA_SYNC_INTERVAL") {
            if let Some(parsed) = parse_u64(&value) {
                config.sync.sync_interval = parsed;
            }
        }
        if let Ok(value) = std::env::var("OBRA_ASSET_TTL") {
            if let Some(parsed) = parse_u64(&value) {
                config.cache.asset_ttl = parsed;
            }
        }

        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.is_empty() {
            return Err("database.url must not be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("database.max_connections must be greater than 0".to_string());
        }
        if self.remote.base_url.is_empty() {
            return Err("remote.base_url must not be empty".to_string());
        }
        if self.remote.base_url.ends_with('/') {
            return Err("remote.base_url must not end with a slash".to_string());
        }
        if self.sync.auto_sync && self.sync.sync_interval == 0 {
            return Err(
                "sync.sync_interval must be positive when auto_sync is enabled".to_string(),
            );
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse().ok()
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}
