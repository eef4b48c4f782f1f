//! The platform deployment: a Postgres server, the identity database on it,
//! identity-service replicas referencing the database, and the API gateway
//! referencing every replica.

use crate::config::AppHostSettings;
use crate::error::Result;
use crate::graph::{DeploymentGraph, UnitSpec};
use crate::launcher::{ExternalLauncher, ProcessLauncher};
use crate::probe::{HttpProbe, TcpProbe};
use std::sync::Arc;

pub const POSTGRES_UNIT: &str = "postgres";
pub const DATABASE_UNIT: &str = "identity-db";
pub const GATEWAY_UNIT: &str = "gateway";

pub fn identity_unit(replica: usize) -> String {
    format!("identity-{}", replica)
}

/// Env key under which the gateway receives a replica's base URL
pub fn identity_reference_key(replica: usize) -> String {
    format!("IDENTITY_SERVICE_{}_URL", replica)
}

pub fn build_deployment(settings: &AppHostSettings) -> Result<DeploymentGraph> {
    let mut graph = DeploymentGraph::new();
    let postgres_address = settings.postgres.address();

    graph.add_unit(
        UnitSpec::new(
            POSTGRES_UNIT,
            Arc::new(ExternalLauncher),
            Arc::new(TcpProbe::new(postgres_address.clone())),
        )
        .with_endpoint(postgres_address.clone()),
    );

    graph.add_unit(
        UnitSpec::new(
            DATABASE_UNIT,
            Arc::new(ExternalLauncher),
            Arc::new(TcpProbe::new(postgres_address)),
        )
        .with_endpoint(settings.postgres.connection_string())
        .wait_for(POSTGRES_UNIT),
    );

    let gateway_launcher: Arc<dyn crate::launcher::Launcher> =
        match settings
            .gateway
            .command
            .as_deref()
            .and_then(ProcessLauncher::from_command_line)
        {
            Some(launcher) => Arc::new(launcher),
            None => Arc::new(ExternalLauncher),
        };
    let gateway_address = format!("{}:{}", settings.gateway.host, settings.gateway.port);
    let mut gateway = UnitSpec::new(
        GATEWAY_UNIT,
        gateway_launcher,
        Arc::new(TcpProbe::new(gateway_address.clone())),
    )
    .with_endpoint(format!("http://{}", gateway_address))
    .with_env("PORT", settings.gateway.port.to_string());

    for (position, port) in settings.identity.ports.iter().enumerate() {
        let replica = position + 1;
        let name = identity_unit(replica);
        let base_url = format!("http://{}:{}", settings.identity.host, port);

        graph.add_unit(
            UnitSpec::new(
                name.clone(),
                Arc::new(ProcessLauncher::new(&settings.identity.binary)),
                Arc::new(HttpProbe::new(format!("{}/health", base_url))?),
            )
            .with_endpoint(base_url)
            .with_env("SERVER_HOST", settings.identity.host.clone())
            .with_env("SERVER_PORT", port.to_string())
            .with_env("DATABASE_RUN_MIGRATIONS", "true")
            .with_reference(DATABASE_UNIT, "DATABASE_URL"),
        );

        gateway = gateway.with_reference(name, identity_reference_key(replica));
    }

    graph.add_unit(gateway);
    Ok(graph)
}
