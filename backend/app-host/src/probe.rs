//! Readiness probes
//!
//! A unit is Ready once its probe succeeds. Databases are probed with a TCP
//! connect, services with an HTTP `GET` on their health endpoint.

use crate::error::{OrchestratorError, Result};
use async_trait::async_trait;
use resilience::with_timeout;
use std::time::Duration;

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// `Ok(())` once the unit accepts traffic
    async fn check(&self) -> Result<()>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Succeeds as soon as it is asked
#[derive(Debug, Default, Clone)]
pub struct AlwaysReady;

#[async_trait]
impl ReadinessProbe for AlwaysReady {
    async fn check(&self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "always-ready".to_string()
    }
}

/// TCP connect probe
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ReadinessProbe for TcpProbe {
    async fn check(&self) -> Result<()> {
        with_timeout(self.timeout, tokio::net::TcpStream::connect(&self.address))
            .await
            .map_err(|e| OrchestratorError::probe(format!("{}: {}", self.address, e)))?
            .map_err(|e| OrchestratorError::probe(format!("{}: {}", self.address, e)))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.address)
    }
}

/// HTTP `GET` probe; any 2xx status counts as ready
#[derive(Debug, Clone)]
pub struct HttpProbe {
    url: String,
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_PROBE_TIMEOUT)
            .build()
            .map_err(|e| OrchestratorError::probe(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl ReadinessProbe for HttpProbe {
    async fn check(&self) -> Result<()> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| OrchestratorError::probe(format!("{}: {}", self.url, e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(OrchestratorError::probe(format!(
                "{} returned {}",
                self.url,
                response.status()
            )))
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
