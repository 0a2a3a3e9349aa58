use std::time::Duration;

use crate::game::registry::SessionRegistry;

pub async fn run(registry: &SessionRegistry, max_idle: Duration) {
    tracing::debug!("session_cleanup: start");
    let evicted = registry.evict_idle(max_idle).await;
    let remaining = registry.len().await;
    if evicted > 0 {
        tracing::info!(evicted, remaining, "session_cleanup: done");
    } else {
        tracing::debug!(remaining, "session_cleanup: nothing to evict");
    }
}
