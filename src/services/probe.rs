use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::core::config::Settings;

/// Checks whether a remote problem URL is live. Implementations never fail:
/// any transport or protocol error counts as unreachable.
#[async_trait]
pub(crate) trait ReachabilityProbe: Send + Sync {
    async fn exists(&self, url: &str) -> bool;
}

#[derive(Debug, Clone)]
pub(crate) struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.probe().timeout_seconds))
            .user_agent(concat!("assignments-rust/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn exists(&self, url: &str) -> bool {
        let reachable = match self.client.get(url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(err) => {
                tracing::debug!(%url, error = %err, "Reachability probe failed");
                false
            }
        };

        metrics::counter!("reachability_probes_total", "reachable" => reachable.to_string())
            .increment(1);
        tracing::debug!(%url, reachable, "Reachability probe finished");
        reachable
    }
}
