//! Dependency-aware scheduler
//!
//! Every unit gets its own task and its own `watch` channel. A task waits
//! until all of its dependencies publish `Ready`, launches the unit, probes it
//! until it is ready and then publishes `Ready` itself. Independent units
//! therefore start concurrently and a dependent never starts early, whatever
//! order its dependencies finish in.
//!
//! The timeout applies to each unit's own `Starting` phase. A dependency that
//! stalls fails with `ReadinessTimeout` and its dependents then fail with
//! `DependencyFailed`, so a long chain of on-time stages is never cut short.
//!
//! The first failure (launch error, early exit, readiness timeout) aborts the
//! whole run: pending tasks are cancelled and units that already started are
//! stopped in reverse start order.

use crate::error::{OrchestratorError, Result};
use crate::graph::{DependencyKind, DeploymentGraph, UnitSpec};
use crate::launcher::RunningUnit;
use crate::probe::ReadinessProbe;
use crate::state::UnitState;
use futures::future::try_join_all;
use resilience::{with_optional_timeout, Backoff};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// How long a launched unit may take to pass its probe. `None` waits
    /// indefinitely.
    pub dependency_timeout: Option<Duration>,
    /// First delay between readiness probes
    pub probe_interval: Duration,
    /// Upper bound for the probe backoff
    pub max_probe_interval: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            dependency_timeout: Some(Duration::from_secs(120)),
            probe_interval: Duration::from_millis(500),
            max_probe_interval: Duration::from_secs(5),
        }
    }
}

type StateBoard = BTreeMap<String, Arc<watch::Sender<UnitState>>>;

/// What a unit task needs to know about one of its dependencies
struct DependencyWatch {
    name: String,
    state: watch::Receiver<UnitState>,
    env_key: Option<String>,
    endpoint: Option<String>,
}

pub struct Orchestrator {
    graph: DeploymentGraph,
    order: Vec<String>,
    states: StateBoard,
    settings: SchedulerSettings,
}

impl Orchestrator {
    /// Validates the graph; nothing is started yet
    pub fn new(graph: DeploymentGraph, settings: SchedulerSettings) -> Result<Self> {
        let order = graph.topological_order()?;
        let states = graph
            .units()
            .iter()
            .map(|unit| {
                let (sender, _) = watch::channel(UnitState::Pending);
                (unit.name().to_string(), Arc::new(sender))
            })
            .collect();

        Ok(Self {
            graph,
            order,
            states,
            settings,
        })
    }

    /// Start order (dependencies before dependents)
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Observe a unit's state, before or during [`Orchestrator::run`]
    pub fn subscribe(&self, unit: &str) -> Option<watch::Receiver<UnitState>> {
        self.states.get(unit).map(|sender| sender.subscribe())
    }

    /// Bring every unit up. Returns once all units are Ready, or with the
    /// first failure after everything already started has been stopped.
    pub async fn run(self) -> Result<Deployment> {
        info!(order = ?self.order, "Starting deployment");

        let mut tasks = JoinSet::new();
        for unit in self.graph.units() {
            let dependencies = self.dependency_watches(unit);
            let state = Arc::clone(&self.states[unit.name()]);
            let unit = unit.clone();
            let settings = self.settings.clone();

            tasks.spawn(async move {
                let name = unit.name().to_string();
                let result = start_unit(unit, dependencies, &state, &settings).await;
                if let Err(err) = &result {
                    state.send_replace(UnitState::Failed(err.to_string()));
                }
                (name, result)
            });
        }

        let mut running: HashMap<String, Box<dyn RunningUnit>> = HashMap::new();
        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(handle))) => {
                    running.insert(name, handle);
                }
                Ok((name, Err(err))) => {
                    error!(unit = %name, error = %err, "Unit failed, aborting deployment");
                    failure = Some(err);
                    break;
                }
                Err(join_err) => {
                    error!(error = %join_err, "Unit task failed, aborting deployment");
                    failure = Some(OrchestratorError::Task(join_err.to_string()));
                    break;
                }
            }
        }

        let deployment = Deployment {
            order: self.order,
            running,
            states: self.states,
        };

        if let Some(err) = failure {
            // Dropping a cancelled task's handle kills its process
            tasks.shutdown().await;
            if let Err(stop_err) = deployment.shutdown().await {
                warn!(error = %stop_err, "Cleanup after failed deployment was incomplete");
            }
            return Err(err);
        }

        info!("All units ready");
        Ok(deployment)
    }

    fn dependency_watches(&self, unit: &UnitSpec) -> Vec<DependencyWatch> {
        unit.dependencies()
            .iter()
            .map(|dependency| DependencyWatch {
                name: dependency.unit.clone(),
                state: self.states[&dependency.unit].subscribe(),
                env_key: match &dependency.kind {
                    DependencyKind::Reference { env_key } => Some(env_key.clone()),
                    DependencyKind::WaitFor => None,
                },
                endpoint: self
                    .graph
                    .unit(&dependency.unit)
                    .and_then(|target| target.endpoint().map(str::to_string)),
            })
            .collect()
    }
}

async fn start_unit(
    unit: UnitSpec,
    dependencies: Vec<DependencyWatch>,
    state: &watch::Sender<UnitState>,
    settings: &SchedulerSettings,
) -> Result<Box<dyn RunningUnit>> {
    let name = unit.name().to_string();

    state.send_replace(UnitState::WaitingOnDependencies);
    if !dependencies.is_empty() {
        debug!(
            unit = %name,
            waiting_on = ?unit.dependency_names().collect::<Vec<_>>(),
            "Waiting on dependencies"
        );
    }
    wait_for_dependencies(&name, &dependencies).await?;

    let mut env = unit.env().clone();
    for dependency in &dependencies {
        if let (Some(key), Some(endpoint)) = (&dependency.env_key, &dependency.endpoint) {
            env.insert(key.clone(), endpoint.clone());
        }
    }

    state.send_replace(UnitState::Starting);
    info!(unit = %name, "Starting unit");
    let mut running = unit.launcher().launch(&name, &env).await?;

    let probe = unit.probe();
    let readiness = with_optional_timeout(
        settings.dependency_timeout,
        wait_until_ready(&name, probe.as_ref(), running.as_mut(), settings),
    )
    .await;

    let failure = match readiness {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err),
        Err(_) => Some(OrchestratorError::ReadinessTimeout {
            unit: name.clone(),
            elapsed: settings.dependency_timeout.unwrap_or_default(),
        }),
    };
    if let Some(err) = failure {
        if let Err(stop_err) = running.stop().await {
            warn!(unit = %name, error = %stop_err, "Failed to stop unit that never became ready");
        }
        return Err(err);
    }

    state.send_replace(UnitState::Ready);
    info!(unit = %name, probe = %probe.describe(), "Unit ready");
    Ok(running)
}

/// Resolves once every dependency is Ready; fails as soon as one fails
async fn wait_for_dependencies(unit: &str, dependencies: &[DependencyWatch]) -> Result<()> {
    let waits = dependencies.iter().map(|dependency| {
        let mut state = dependency.state.clone();
        async move {
            let settled = state
                .wait_for(UnitState::is_settled)
                .await
                .map(|current| current.is_ready())
                .unwrap_or(false);
            if settled {
                Ok(())
            } else {
                Err(OrchestratorError::DependencyFailed {
                    unit: unit.to_string(),
                    dependency: dependency.name.clone(),
                })
            }
        }
    });

    try_join_all(waits).await.map(|_| ())
}

async fn wait_until_ready(
    unit: &str,
    probe: &dyn ReadinessProbe,
    running: &mut dyn RunningUnit,
    settings: &SchedulerSettings,
) -> Result<()> {
    let mut backoff = Backoff::new(settings.probe_interval, settings.max_probe_interval);

    loop {
        if let Some(status) = running.exit_status()? {
            return Err(OrchestratorError::UnitExited {
                unit: unit.to_string(),
                status,
            });
        }

        match probe.check().await {
            Ok(()) => return Ok(()),
            Err(err) => {
                let delay = backoff.next_delay();
                debug!(
                    unit = %unit,
                    attempt = backoff.attempts(),
                    error = %err,
                    retry_in = ?delay,
                    "Unit not ready yet"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// A fully started deployment
pub struct Deployment {
    order: Vec<String>,
    running: HashMap<String, Box<dyn RunningUnit>>,
    states: StateBoard,
}

impl Deployment {
    pub fn state(&self, unit: &str) -> Option<UnitState> {
        self.states.get(unit).map(|sender| sender.borrow().clone())
    }

    pub fn subscribe(&self, unit: &str) -> Option<watch::Receiver<UnitState>> {
        self.states.get(unit).map(|sender| sender.subscribe())
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// First unit (in start order) that has exited on its own, with its exit
    /// status. The unit is marked Failed.
    pub fn exited_unit(&mut self) -> Option<(String, String)> {
        for name in &self.order {
            let Some(running) = self.running.get_mut(name) else {
                continue;
            };
            let status = match running.exit_status() {
                Ok(Some(status)) => status,
                Ok(None) => continue,
                Err(err) => err.to_string(),
            };
            if let Some(state) = self.states.get(name) {
                state.send_replace(UnitState::Failed(status.clone()));
            }
            self.running.remove(name);
            return Some((name.clone(), status));
        }
        None
    }

    /// Stop units in reverse start order. Every unit ends in `Stopped` unless
    /// it had already failed; the first stop error is returned after all
    /// units have been attempted.
    pub async fn shutdown(mut self) -> Result<()> {
        let mut first_error = None;

        for name in self.order.iter().rev() {
            if let Some(mut running) = self.running.remove(name) {
                info!(unit = %name, "Stopping unit");
                if let Err(err) = running.stop().await {
                    error!(unit = %name, error = %err, "Failed to stop unit");
                    first_error.get_or_insert(err);
                }
            }
            if let Some(state) = self.states.get(name) {
                state.send_if_modified(|current| {
                    if current.is_failed() || *current == UnitState::Stopped {
                        false
                    } else {
                        *current = UnitState::Stopped;
                        true
                    }
                });
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
