use async_trait::async_trait;

/// Answers "is the remote worth trying right now".
///
/// The probe is advisory. A `true` answer does not guarantee a call will
/// succeed; callers still classify per-call failures. A `false` answer
/// short-circuits remote work so offline paths stay fast.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}
