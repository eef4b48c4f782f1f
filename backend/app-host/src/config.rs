//! Configuration for the app host
//!
//! Read from environment variables (and `.env` in debug builds).

use crate::scheduler::SchedulerSettings;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppHostSettings {
    /// Per-unit readiness deadline; `None` waits indefinitely
    pub dependency_timeout: Option<Duration>,
    pub probe_interval: Duration,
    pub postgres: PostgresSettings,
    pub identity: IdentitySettings,
    pub gateway: GatewaySettings,
}

#[derive(Debug, Clone)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl PostgresSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

#[derive(Debug, Clone)]
pub struct IdentitySettings {
    pub binary: PathBuf,
    pub host: String,
    /// One replica per port
    pub ports: Vec<u16>,
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// `None` when the gateway is started outside the app host
    pub command: Option<String>,
    pub host: String,
    pub port: u16,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T>(key: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var_or(key, default)
        .trim()
        .parse()
        .with_context(|| format!("Invalid {}", key))
}

impl AppHostSettings {
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
        }
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        let timeout_secs: u64 = parse_or("APPHOST_DEPENDENCY_TIMEOUT_SECS", "120")?;
        let probe_interval_ms: u64 = parse_or("APPHOST_PROBE_INTERVAL_MS", "500")?;

        let ports = var_or("IDENTITY_PORTS", "8081,8082")
            .split(',')
            .map(str::trim)
            .filter(|port| !port.is_empty())
            .map(|port| {
                port.parse::<u16>()
                    .with_context(|| format!("Invalid port in IDENTITY_PORTS: {}", port))
            })
            .collect::<Result<Vec<_>>>()?;
        if ports.is_empty() {
            anyhow::bail!("IDENTITY_PORTS must list at least one port");
        }

        Ok(Self {
            dependency_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            probe_interval: Duration::from_millis(probe_interval_ms.max(1)),
            postgres: PostgresSettings {
                host: var_or("POSTGRES_HOST", "localhost"),
                port: parse_or("POSTGRES_PORT", "5432")?,
                user: var_or("POSTGRES_USER", "postgres"),
                password: var_or("POSTGRES_PASSWORD", "postgres"),
                database: var_or("IDENTITY_DATABASE", "identity"),
            },
            identity: IdentitySettings {
                binary: PathBuf::from(var_or(
                    "IDENTITY_SERVICE_BIN",
                    "target/debug/identity-service",
                )),
                host: var_or("IDENTITY_HOST", "127.0.0.1"),
                ports,
            },
            gateway: GatewaySettings {
                command: env::var("GATEWAY_COMMAND")
                    .ok()
                    .filter(|command| !command.trim().is_empty()),
                host: var_or("GATEWAY_HOST", "127.0.0.1"),
                port: parse_or("GATEWAY_PORT", "8080")?,
            },
        })
    }

    pub fn scheduler(&self) -> SchedulerSettings {
        SchedulerSettings {
            dependency_timeout: self.dependency_timeout,
            probe_interval: self.probe_interval,
            max_probe_interval: (self.probe_interval * 10).max(Duration::from_secs(1)),
        }
    }
}
