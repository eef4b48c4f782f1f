//! Unit launchers
//!
//! A launcher turns a unit declaration into something running and hands back
//! a [`RunningUnit`] the scheduler can poll and stop.

use crate::error::{OrchestratorError, Result};
use async_trait::async_trait;
use resilience::with_timeout;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Grace period for a killed process to be reaped
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait Launcher: Send + Sync {
    /// Start the unit with `env` added to its environment
    async fn launch(&self, unit: &str, env: &BTreeMap<String, String>)
        -> Result<Box<dyn RunningUnit>>;
}

#[async_trait]
pub trait RunningUnit: Send {
    /// `Some(status)` once the unit has exited on its own
    fn exit_status(&mut self) -> Result<Option<String>>;

    async fn stop(&mut self) -> Result<()>;
}

/// Units managed outside the orchestrator (a database already running on the
/// host). Launching is a no-op; readiness is left to the probe.
#[derive(Debug, Default, Clone)]
pub struct ExternalLauncher;

struct ExternalUnit;

#[async_trait]
impl RunningUnit for ExternalUnit {
    fn exit_status(&mut self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Launcher for ExternalLauncher {
    async fn launch(
        &self,
        unit: &str,
        _env: &BTreeMap<String, String>,
    ) -> Result<Box<dyn RunningUnit>> {
        debug!(unit = %unit, "Unit is managed externally");
        Ok(Box::new(ExternalUnit))
    }
}

/// Spawns a local process. The parent environment is inherited, then
/// overlaid with the unit's own variables and its injected references.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Parse `"program arg1 arg2"`; `None` for a blank command line
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program).with_args(parts.map(str::to_string)))
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }
}

struct ProcessUnit {
    unit: String,
    child: Child,
}

#[async_trait]
impl RunningUnit for ProcessUnit {
    fn exit_status(&mut self) -> Result<Option<String>> {
        self.child
            .try_wait()
            .map(|status| status.map(|s| s.to_string()))
            .map_err(|e| OrchestratorError::Task(format!("{}: {}", self.unit, e)))
    }

    async fn stop(&mut self) -> Result<()> {
        if self.exit_status()?.is_some() {
            return Ok(());
        }

        self.child.start_kill().map_err(|e| OrchestratorError::Stop {
            unit: self.unit.clone(),
            reason: e.to_string(),
        })?;

        let status = with_timeout(STOP_TIMEOUT, self.child.wait())
            .await
            .map_err(|e| OrchestratorError::Stop {
                unit: self.unit.clone(),
                reason: e.to_string(),
            })?
            .map_err(|e| OrchestratorError::Stop {
                unit: self.unit.clone(),
                reason: e.to_string(),
            })?;

        info!(unit = %self.unit, status = %status, "Process stopped");
        Ok(())
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(
        &self,
        unit: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<Box<dyn RunningUnit>> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(env)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| {
            warn!(unit = %unit, program = %self.program.display(), "Failed to spawn process");
            OrchestratorError::Launch {
                unit: unit.to_string(),
                reason: e.to_string(),
            }
        })?;

        info!(
            unit = %unit,
            pid = child.id().unwrap_or_default(),
            program = %self.program.display(),
            "Process spawned"
        );

        Ok(Box::new(ProcessUnit {
            unit: unit.to_string(),
            child,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_parsing() {
        let launcher = ProcessLauncher::from_command_line("dotnet run --project Gateway").unwrap();
        assert_eq!(launcher.program, PathBuf::from("dotnet"));
        assert_eq!(launcher.args, vec!["run", "--project", "Gateway"]);

        assert!(ProcessLauncher::from_command_line("   ").is_none());
    }

    #[tokio::test]
    async fn test_external_unit_never_exits() {
        let mut unit = ExternalLauncher
            .launch("postgres", &BTreeMap::new())
            .await
            .unwrap();

        assert_eq!(unit.exit_status().unwrap(), None);
        assert!(unit.stop().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let launcher = ProcessLauncher::new("/nonexistent/definitely-not-a-binary");
        let result = launcher.launch("ghost", &BTreeMap::new()).await;

        assert!(matches!(result, Err(OrchestratorError::Launch { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_receives_injected_env_and_stops() {
        let script = "test \"$DATABASE_URL\" = postgres://db && sleep 30";
        let launcher = ProcessLauncher::new("sh").with_args(["-c".to_string(), script.to_string()]);
        let mut env = BTreeMap::new();
        env.insert("DATABASE_URL".to_string(), "postgres://db".to_string());

        let mut unit = launcher.launch("identity-1", &env).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Still sleeping means the env check passed
        assert_eq!(unit.exit_status().unwrap(), None);
        unit.stop().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_reported() {
        let launcher =
            ProcessLauncher::new("sh").with_args(["-c".to_string(), "exit 3".to_string()]);
        let mut unit = launcher.launch("short-lived", &BTreeMap::new()).await.unwrap();

        let mut status = None;
        for _ in 0..50 {
            status = unit.exit_status().unwrap();
            if status.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(status.is_some());
    }
}
