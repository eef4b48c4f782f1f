/// Identity Service Main Entry Point
///
/// Starts the HTTP API with:
/// - PostgreSQL credential store (in-memory when no database is configured)
/// - Kafka event publisher (logging-only when no broker is configured)
use anyhow::{Context, Result};
use identity_service::{
    config::Settings,
    db::{CredentialStore, InMemoryCredentialStore, PgCredentialStore},
    http::start_http_server,
    security::TokenIssuer,
    services::{
        AuthService, EventPublisher, KafkaEventPublisher, LoggingEventPublisher,
        DEFAULT_PUBLISH_TIMEOUT,
    },
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "identity_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting Identity Service");

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    let issuer = TokenIssuer::new(&settings.jwt).context("Failed to initialize token issuer")?;
    info!(
        issuer = %settings.jwt.issuer,
        audience = %settings.jwt.audience,
        expiry_minutes = settings.jwt.expiry_minutes,
        "Token issuer initialized"
    );

    let store: Arc<dyn CredentialStore> = match &settings.database {
        Some(database) => {
            let db_pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .acquire_timeout(Duration::from_secs(database.acquire_timeout))
                .connect(&database.url)
                .await
                .context("Failed to connect to PostgreSQL")?;

            info!(
                "Database pool initialized with {} max connections",
                database.max_connections
            );

            let store = PgCredentialStore::new(db_pool);
            if database.run_migrations {
                store
                    .migrate()
                    .await
                    .context("Failed to run database migrations")?;
                info!("Database migrations completed");
            }

            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set; accounts are kept in memory and lost on exit");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let publish_timeout = settings
        .kafka
        .as_ref()
        .map_or(DEFAULT_PUBLISH_TIMEOUT, |kafka| kafka.publish_timeout());
    let publisher: Arc<dyn EventPublisher> = match &settings.kafka {
        Some(kafka) => match KafkaEventPublisher::new(&kafka.brokers.join(","), &kafka.topic) {
            Ok(producer) => {
                info!(topic = %kafka.topic, "Kafka producer initialized");
                Arc::new(producer)
            }
            Err(err) => {
                error!("Failed to initialize Kafka producer: {}", err);
                Arc::new(LoggingEventPublisher)
            }
        },
        None => {
            info!("Kafka brokers not configured; running without event publishing");
            Arc::new(LoggingEventPublisher)
        }
    };

    let auth = Arc::new(
        AuthService::new(store, Arc::new(issuer), publisher).with_publish_timeout(publish_timeout),
    );

    start_http_server(
        auth,
        &settings.server.host,
        settings.server.port,
        shutdown_signal(),
    )
    .await?;

    info!("Identity Service stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}
