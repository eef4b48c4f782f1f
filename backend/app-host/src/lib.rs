//! App host: starts the platform's deployment units in dependency order
//!
//! ## Modules
//!
//! - `config`: Settings from the environment
//! - `deployment`: The platform's unit graph
//! - `error`: Error types
//! - `graph`: Units, dependency edges, validation and start order
//! - `launcher`: Process and external launchers
//! - `probe`: TCP and HTTP readiness probes
//! - `scheduler`: Runs the graph, stops it in reverse order
//! - `state`: Unit lifecycle states

pub mod config;
pub mod deployment;
pub mod error;
pub mod graph;
pub mod launcher;
pub mod probe;
pub mod scheduler;
pub mod state;

pub use error::{OrchestratorError, Result};
pub use graph::{Dependency, DependencyKind, DeploymentGraph, UnitSpec};
pub use launcher::{ExternalLauncher, Launcher, ProcessLauncher, RunningUnit};
pub use probe::{AlwaysReady, HttpProbe, ReadinessProbe, TcpProbe};
pub use scheduler::{Deployment, Orchestrator, SchedulerSettings};
pub use state::UnitState;
