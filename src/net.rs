// src/net.rs

//! Connectivity probe used before runs that will send a notification.

use std::time::Duration;

use tracing::warn;

/// How often the probe retries before giving up.
const MAX_ATTEMPTS: u32 = 10;

/// Wait until `host` resolves, retrying with exponential backoff
/// (2^attempt seconds). Returns false when still offline after the last
/// attempt.
pub async fn wait_online(host: &str) -> bool {
    for attempt in 0..MAX_ATTEMPTS {
        let resolved = tokio::net::lookup_host((host, 443))
            .await
            .map(|mut addrs| addrs.next().is_some())
            .unwrap_or(false);
        if resolved {
            return true;
        }

        if attempt + 1 < MAX_ATTEMPTS {
            let delay = 2u64.saturating_pow(attempt);
            warn!(host, delay_secs = delay, "not online, retrying");
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }
    }
    false
}
