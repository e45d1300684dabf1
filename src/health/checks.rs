use super::models::{CheckOutput, HealthCheck};
use crate::configuration::{CheckKind, CheckSettings};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

const SLOW_RESPONSE_THRESHOLD_MS: u64 = 1000;

/// Probes a `host:port` endpoint by opening a TCP connection.
/// The classic broker-port probe expressed as a registered check.
pub struct TcpPortCheck {
    addr: String,
}

impl TcpPortCheck {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait]
impl HealthCheck for TcpPortCheck {
    async fn check(&self) -> anyhow::Result<CheckOutput> {
        match tokio::net::TcpStream::connect(&self.addr).await {
            Ok(_) => Ok(CheckOutput::healthy(format!("{} accepts connections", self.addr))),
            Err(err) => Ok(CheckOutput::unhealthy(format!(
                "{} unreachable: {}",
                self.addr, err
            ))),
        }
    }
}

/// Probes an HTTP dependency; any 2xx is healthy, a slow 2xx is degraded.
pub struct HttpCheck {
    url: String,
    client: reqwest::Client,
}

impl HttpCheck {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl HealthCheck for HttpCheck {
    async fn check(&self) -> anyhow::Result<CheckOutput> {
        let start = Instant::now();
        match self.client.get(&self.url).send().await {
            Ok(response) => {
                let elapsed = start.elapsed().as_millis() as u64;
                if response.status().is_success() {
                    if elapsed > SLOW_RESPONSE_THRESHOLD_MS {
                        Ok(CheckOutput::degraded(format!(
                            "{} responding slowly ({} ms)",
                            self.url, elapsed
                        )))
                    } else {
                        Ok(CheckOutput::healthy(format!(
                            "{} returned {} in {} ms",
                            self.url,
                            response.status().as_u16(),
                            elapsed
                        )))
                    }
                } else {
                    Ok(CheckOutput::unhealthy(format!(
                        "{} returned status {}",
                        self.url,
                        response.status()
                    )))
                }
            }
            Err(err) => Ok(CheckOutput::unhealthy(format!(
                "{} error: {}",
                self.url, err
            ))),
        }
    }
}

/// Builds a check from a configuration entry.
pub fn from_settings(settings: &CheckSettings) -> anyhow::Result<Arc<dyn HealthCheck>> {
    match settings.kind {
        CheckKind::Tcp => Ok(Arc::new(TcpPortCheck::new(&settings.target))),
        CheckKind::Http => Ok(Arc::new(HttpCheck::new(&settings.target)?)),
    }
}
