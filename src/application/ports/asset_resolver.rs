use async_trait::async_trait;

/// Resolves stored asset references (object keys) into usable URLs.
///
/// Resolution is best effort: `None` leaves the record serving its raw
/// reference, which read paths tolerate. Implementations are expected to
/// cache, signed URLs are typically short-lived.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    async fn resolve_url(&self, reference: &str) -> Option<String>;
}
