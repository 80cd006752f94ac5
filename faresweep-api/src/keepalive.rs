use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use faresweep_store::app_config::KeepaliveConfig;

/// Start the self-ping loop if a target URL is configured.
///
/// Runs on its own; nothing else in the service waits on or talks to it.
pub fn spawn_keepalive(config: &KeepaliveConfig) -> Option<JoinHandle<()>> {
    let url = config.url.clone().filter(|u| !u.is_empty())?;
    let interval = Duration::from_secs(config.interval_secs.max(1));

    let client = match reqwest::Client::builder().timeout(Duration::from_secs(30)).build() {
        Ok(client) => client,
        Err(e) => {
            error!("Keepalive disabled, could not build HTTP client: {}", e);
            return None;
        }
    };

    info!("Keepalive pinging {} every {:?}", url, interval);
    Some(tokio::spawn(run_keepalive(client, url, interval)))
}

async fn run_keepalive(client: reqwest::Client, url: String, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately; the service is obviously awake at startup
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => info!("Keepalive ping ok ({})", resp.status()),
            Ok(resp) => warn!("Keepalive ping returned {}", resp.status()),
            Err(e) => error!("Keepalive ping failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_without_url() {
        let config = KeepaliveConfig { url: None, interval_secs: 60 };
        assert!(spawn_keepalive(&config).is_none());

        let blank = KeepaliveConfig { url: Some(String::new()), interval_secs: 60 };
        assert!(spawn_keepalive(&blank).is_none());
    }
}
