//! Configuration management for Identity Service
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! Settings are validated once here; nothing downstream re-reads the
//! environment.
//!
//! # Example
//!
//! ```no_run
//! use identity_service::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     println!("JWT issuer: {}", settings.jwt.issuer);
//!     Ok(())
//! }
//! ```

use crate::error::{IdentityError, Result as IdentityResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::info;

/// Minimum HMAC-SHA256 key length (256 bits)
pub const MIN_SECRET_LENGTH: usize = 32;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub jwt: JwtSettings,
    pub server: ServerSettings,
    /// `None` runs against the in-memory credential store
    pub database: Option<DatabaseSettings>,
    /// `None` runs without a broker; events are only logged
    pub kafka: Option<KafkaSettings>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            jwt: JwtSettings::from_env()?,
            server: ServerSettings::from_env()?,
            database: DatabaseSettings::from_env()?,
            kafka: KafkaSettings::from_env()?,
        })
    }
}

/// JWT signing settings
///
/// All four values are required; a missing or malformed one is a startup
/// failure, never a per-request error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    pub secret_key: String,
    pub issuer: String,
    pub audience: String,
    pub expiry_minutes: u32,
}

impl JwtSettings {
    pub fn from_env() -> Result<Self> {
        let settings = Self {
            secret_key: env::var("JWT_SECRET_KEY").context("JWT_SECRET_KEY must be set")?,
            issuer: env::var("JWT_ISSUER").context("JWT_ISSUER must be set")?,
            audience: env::var("JWT_AUDIENCE").context("JWT_AUDIENCE must be set")?,
            expiry_minutes: env::var("JWT_EXPIRY_MINUTES")
                .context("JWT_EXPIRY_MINUTES must be set")?
                .trim()
                .parse()
                .context("Invalid JWT_EXPIRY_MINUTES")?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> IdentityResult<()> {
        if self.secret_key.len() < MIN_SECRET_LENGTH {
            return Err(IdentityError::Configuration(format!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        if self.issuer.trim().is_empty() {
            return Err(IdentityError::Configuration(
                "JWT issuer must not be empty".to_string(),
            ));
        }
        if self.audience.trim().is_empty() {
            return Err(IdentityError::Configuration(
                "JWT audience must not be empty".to_string(),
            ));
        }
        if self.expiry_minutes == 0 {
            return Err(IdentityError::Configuration(
                "JWT expiry must be at least one minute".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
        })
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: u64,
    /// Create the tables on startup; off when the schema is managed elsewhere
    pub run_migrations: bool,
}

impl DatabaseSettings {
    fn from_env() -> Result<Option<Self>> {
        let Ok(url) = env::var("DATABASE_URL") else {
            return Ok(None);
        };

        Ok(Some(Self {
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
            run_migrations: env::var("DATABASE_RUN_MIGRATIONS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("Invalid DATABASE_RUN_MIGRATIONS")?,
        }))
    }
}

/// Kafka event streaming settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaSettings {
    pub brokers: Vec<String>,
    pub topic: String,
    pub publish_timeout_ms: u64,
}

impl KafkaSettings {
    fn from_env() -> Result<Option<Self>> {
        let Ok(brokers_str) = env::var("KAFKA_BROKERS") else {
            return Ok(None);
        };
        let brokers: Vec<String> = brokers_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if brokers.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            brokers,
            topic: env::var("KAFKA_TOPIC").unwrap_or_else(|_| "identity.user-created".to_string()),
            publish_timeout_ms: env::var("KAFKA_PUBLISH_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("Invalid KAFKA_PUBLISH_TIMEOUT_MS")?,
        }))
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const TEST_SECRET: &str = "k3Q9vZp2Lx7Wm4Rt8Yb1Nc6Hd0Fg5Js2";

    fn clear_jwt_env() {
        env::remove_var("JWT_SECRET_KEY");
        env::remove_var("JWT_ISSUER");
        env::remove_var("JWT_AUDIENCE");
        env::remove_var("JWT_EXPIRY_MINUTES");
    }

    #[test]
    #[serial]
    fn test_jwt_settings_from_env() {
        env::set_var("JWT_SECRET_KEY", TEST_SECRET);
        env::set_var("JWT_ISSUER", "orderflow-identity");
        env::set_var("JWT_AUDIENCE", "orderflow-api");
        env::set_var("JWT_EXPIRY_MINUTES", "60");

        let settings = JwtSettings::from_env().unwrap();

        assert_eq!(settings.secret_key, TEST_SECRET);
        assert_eq!(settings.issuer, "orderflow-identity");
        assert_eq!(settings.audience, "orderflow-api");
        assert_eq!(settings.expiry_minutes, 60);

        clear_jwt_env();
    }

    #[test]
    #[serial]
    fn test_missing_jwt_value_is_fatal() {
        clear_jwt_env();
        env::set_var("JWT_SECRET_KEY", TEST_SECRET);
        env::set_var("JWT_ISSUER", "orderflow-identity");
        env::set_var("JWT_EXPIRY_MINUTES", "60");

        let err = JwtSettings::from_env().unwrap_err();
        assert!(err.to_string().contains("JWT_AUDIENCE"));

        clear_jwt_env();
    }

    #[test]
    #[serial]
    fn test_malformed_expiry_is_fatal() {
        env::set_var("JWT_SECRET_KEY", TEST_SECRET);
        env::set_var("JWT_ISSUER", "orderflow-identity");
        env::set_var("JWT_AUDIENCE", "orderflow-api");
        env::set_var("JWT_EXPIRY_MINUTES", "soon");

        assert!(JwtSettings::from_env().is_err());

        clear_jwt_env();
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let settings = JwtSettings {
            secret_key: "short".to_string(),
            issuer: "issuer".to_string(),
            audience: "audience".to_string(),
            expiry_minutes: 60,
        };
        assert!(matches!(
            settings.validate(),
            Err(IdentityError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_expiry() {
        let settings = JwtSettings {
            secret_key: TEST_SECRET.to_string(),
            issuer: "issuer".to_string(),
            audience: "audience".to_string(),
            expiry_minutes: 0,
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_kafka_settings_optional() {
        env::remove_var("KAFKA_BROKERS");
        assert!(KafkaSettings::from_env().unwrap().is_none());

        env::set_var("KAFKA_BROKERS", "localhost:9092, localhost:9093");
        env::set_var("KAFKA_TOPIC", "test-topic");

        let settings = KafkaSettings::from_env().unwrap().unwrap();
        assert_eq!(settings.brokers, vec!["localhost:9092", "localhost:9093"]);
        assert_eq!(settings.topic, "test-topic");
        assert_eq!(settings.publish_timeout(), Duration::from_millis(5000));

        env::remove_var("KAFKA_BROKERS");
        env::remove_var("KAFKA_TOPIC");
    }

    #[test]
    #[serial]
    fn test_database_settings_defaults() {
        env::set_var("DATABASE_URL", "postgres://localhost/identity");

        let settings = DatabaseSettings::from_env().unwrap().unwrap();
        assert_eq!(settings.url, "postgres://localhost/identity");
        assert_eq!(settings.max_connections, 10);
        assert!(!settings.run_migrations);

        env::set_var("DATABASE_RUN_MIGRATIONS", "true");
        assert!(DatabaseSettings::from_env().unwrap().unwrap().run_migrations);
        env::remove_var("DATABASE_RUN_MIGRATIONS");

        env::remove_var("DATABASE_URL");
        assert!(DatabaseSettings::from_env().unwrap().is_none());
    }
}
