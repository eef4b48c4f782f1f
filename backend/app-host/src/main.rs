/// App Host Main Entry Point
///
/// Starts Postgres-dependent identity replicas and the gateway in dependency
/// order, then keeps them running until Ctrl+C / SIGTERM or until one exits.
use anyhow::{Context, Result};
use app_host::{config::AppHostSettings, deployment::build_deployment, Orchestrator};
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

const EXIT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "app_host=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting App Host");

    let settings = AppHostSettings::load().context("Failed to load configuration")?;
    info!(
        dependency_timeout = ?settings.dependency_timeout,
        identity_replicas = settings.identity.ports.len(),
        "Configuration loaded successfully"
    );

    let graph = build_deployment(&settings).context("Failed to build deployment graph")?;
    let orchestrator = Orchestrator::new(graph, settings.scheduler())
        .context("Invalid deployment graph")?;

    let mut deployment = orchestrator
        .run()
        .await
        .context("Deployment failed to start")?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut exit_check = tokio::time::interval(EXIT_CHECK_INTERVAL);

    let exited = loop {
        tokio::select! {
            _ = &mut shutdown => break None,
            _ = exit_check.tick() => {
                if let Some(exited) = deployment.exited_unit() {
                    break Some(exited);
                }
            }
        }
    };

    if let Some((unit, status)) = &exited {
        error!(unit = %unit, status = %status, "Unit exited unexpectedly, shutting down");
    }

    deployment
        .shutdown()
        .await
        .context("Failed to stop every unit")?;
    info!("App Host stopped");

    match exited {
        Some((unit, status)) => Err(anyhow::anyhow!("Unit '{}' exited: {}", unit, status)),
        None => Ok(()),
    }
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
