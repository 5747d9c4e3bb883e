use async_trait::async_trait;
use reqwest::Client;

use crate::application::ports::ConnectivityProbe;

/// Probes the backend's health endpoint to decide whether the remote is
/// worth trying. Any transport failure or non-success status reads as
/// offline; the engine then works purely against the mirror.
pub struct HttpHealthProbe {
    client: Client,
    health_url: String,
}

impl HttpHealthProbe {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            health_url: format!("{base_url}/health"),
        }
    }
}

#[async_trait]
impl ConnectivityProbe for HttpHealthProbe {
    async fn is_online(&self) -> bool {
        match self.client.get(&self.health_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::debug!(target: "connectivity", error = %err, "health probe failed");
                false
            }
        }
    }
}
