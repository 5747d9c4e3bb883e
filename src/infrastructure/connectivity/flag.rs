use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::application::ports::ConnectivityProbe;

/// Connectivity state set by the host application.
///
/// Desktop shells usually know when the OS reports the network up or down;
/// they flip this flag and the engine follows. Also the probe of choice in
/// tests.
pub struct ConnectivityFlag {
    online: AtomicBool,
}

impl ConnectivityFlag {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityProbe for ConnectivityFlag {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
