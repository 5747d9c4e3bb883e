use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::AssetResolver;

#[derive(Clone)]
struct CacheEntry {
    url: String,
    expires_at: Instant,
}

/// Caching layer in front of an [`AssetResolver`].
///
/// Resolved URLs are typically signed and short-lived, so entries expire;
/// failed resolutions are not cached and will be retried on the next read.
pub struct MemoryAssetCache {
    inner: Arc<dyn AssetResolver>,
    cache: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl MemoryAssetCache {
    pub fn new(inner: Arc<dyn AssetResolver>, ttl_seconds: u64) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    pub async fn cleanup_expired(&self) {
        let mut cache = self.cache.write().await;
        let now = Instant::now();
        cache.retain(|_, entry| entry.expires_at > now);
    }

    pub async fn size(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[async_trait]
impl AssetResolver for MemoryAssetCache {
    async fn resolve_url(&self, reference: &str) -> Option<String> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(reference) {
                if entry.expires_at > Instant::now() {
                    return Some(entry.url.clone());
                }
            }
        }

        let url = self.inner.resolve_url(reference).await?;
        let mut cache = self.cache.write().await;
        cache.insert(
            reference.to_string(),
            CacheEntry {
                url: url.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Some(url)
    }
}
