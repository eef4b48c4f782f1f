//! Error types for the deployment orchestrator

use std::time::Duration;
use thiserror::Error;

/// Result type for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Unit '{0}' is declared more than once")]
    DuplicateUnit(String),

    #[error("Unit '{unit}' depends on unknown unit '{dependency}'")]
    UnknownDependency { unit: String, dependency: String },

    #[error("Unit '{0}' depends on itself")]
    SelfDependency(String),

    #[error("Dependency cycle between units: {}", .0.join(", "))]
    Cycle(Vec<String>),

    #[error("Unit '{unit}' references '{dependency}', which exposes no endpoint")]
    MissingEndpoint { unit: String, dependency: String },

    #[error("Unit '{unit}' cannot start: dependency '{dependency}' failed")]
    DependencyFailed { unit: String, dependency: String },

    #[error("Unit '{unit}' did not become ready within {elapsed:?}")]
    ReadinessTimeout { unit: String, elapsed: Duration },

    #[error("Failed to launch unit '{unit}': {reason}")]
    Launch { unit: String, reason: String },

    #[error("Unit '{unit}' exited before becoming ready ({status})")]
    UnitExited { unit: String, status: String },

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Failed to stop unit '{unit}': {reason}")]
    Stop { unit: String, reason: String },

    #[error("Unit task failed: {0}")]
    Task(String),
}

impl OrchestratorError {
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Whether the error was raised before any unit was started
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateUnit(_)
                | Self::UnknownDependency { .. }
                | Self::SelfDependency(_)
                | Self::Cycle(_)
                | Self::MissingEndpoint { .. }
        )
    }
}
