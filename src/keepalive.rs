//! Periodic self-ping that keeps a sleeping hosted instance awake.
//!
//! Failures are logged and the loop carries on; nothing else depends on it.

use std::time::Duration;

use reqwest::StatusCode;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

// ---

/// Spawn the keep-alive loop. The first ping happens one interval after start.
pub fn spawn(url: String, every: Duration) -> JoinHandle<()> {
    // ---
    tracing::info!("Keep-alive started, pinging {} every {:?}", url, every);
    let client = reqwest::Client::new();

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match ping(&client, &url).await {
                Ok(status) if is_alive(status) => tracing::info!("Keep-alive ping ok: {}", status),
                Ok(status) => tracing::warn!("Keep-alive ping failed: {}", status),
                Err(e) => tracing::warn!("Keep-alive ping failed: {}", e),
            }
        }
    })
}

/// Only a 2xx answer means the instance is up.
pub fn is_alive(status: StatusCode) -> bool {
    status.is_success()
}

/// GET `url` once and return the response status.
pub async fn ping(client: &reqwest::Client, url: &str) -> Result<StatusCode, reqwest::Error> {
    // ---
    let response = client.get(url).send().await?;
    Ok(response.status())
}
