//! Deployment graph
//!
//! Nodes are deployment units, edges are dependencies. A `wait_for` edge only
//! gates startup; a `with_reference` edge also injects the dependency's
//! endpoint into the dependent's environment under a chosen key.

use crate::error::{OrchestratorError, Result};
use crate::launcher::Launcher;
use crate::probe::ReadinessProbe;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyKind {
    WaitFor,
    /// Endpoint injected as `env_key`
    Reference { env_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub unit: String,
    pub kind: DependencyKind,
}

/// One deployable unit and its edges
#[derive(Clone)]
pub struct UnitSpec {
    name: String,
    launcher: Arc<dyn Launcher>,
    probe: Arc<dyn ReadinessProbe>,
    endpoint: Option<String>,
    env: BTreeMap<String, String>,
    dependencies: Vec<Dependency>,
}

impl fmt::Debug for UnitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitSpec")
            .field("name", &self.name)
            .field("probe", &self.probe.describe())
            .field("endpoint", &self.endpoint)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

impl UnitSpec {
    pub fn new(
        name: impl Into<String>,
        launcher: Arc<dyn Launcher>,
        probe: Arc<dyn ReadinessProbe>,
    ) -> Self {
        Self {
            name: name.into(),
            launcher,
            probe,
            endpoint: None,
            env: BTreeMap::new(),
            dependencies: Vec::new(),
        }
    }

    /// Address handed to units that reference this one
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Start only after `unit` is Ready
    pub fn wait_for(mut self, unit: impl Into<String>) -> Self {
        self.add_dependency(unit.into(), DependencyKind::WaitFor);
        self
    }

    /// Start only after `unit` is Ready, with its endpoint under `env_key`
    pub fn with_reference(mut self, unit: impl Into<String>, env_key: impl Into<String>) -> Self {
        self.add_dependency(
            unit.into(),
            DependencyKind::Reference {
                env_key: env_key.into(),
            },
        );
        self
    }

    /// A reference supersedes a plain wait on the same unit
    fn add_dependency(&mut self, unit: String, kind: DependencyKind) {
        match self.dependencies.iter_mut().find(|dep| dep.unit == unit) {
            Some(existing) => {
                if let DependencyKind::Reference { .. } = kind {
                    existing.kind = kind;
                }
            }
            None => self.dependencies.push(Dependency { unit, kind }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|dep| dep.unit.as_str())
    }

    pub fn launcher(&self) -> Arc<dyn Launcher> {
        Arc::clone(&self.launcher)
    }

    pub fn probe(&self) -> Arc<dyn ReadinessProbe> {
        Arc::clone(&self.probe)
    }
}

/// Units in declaration order
#[derive(Debug, Clone, Default)]
pub struct DeploymentGraph {
    units: Vec<UnitSpec>,
}

impl DeploymentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self, unit: UnitSpec) -> &mut Self {
        self.units.push(unit);
        self
    }

    pub fn units(&self) -> &[UnitSpec] {
        &self.units
    }

    pub fn unit(&self, name: &str) -> Option<&UnitSpec> {
        self.units.iter().find(|unit| unit.name == name)
    }

    /// Check the graph and return unit names in start order.
    ///
    /// Rejects duplicate names, unknown dependencies, self-dependencies,
    /// references to units without an endpoint, and cycles. Among units whose
    /// dependencies are satisfied, declaration order decides.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(self.units.len());
        for (position, unit) in self.units.iter().enumerate() {
            if index.insert(unit.name.as_str(), position).is_some() {
                return Err(OrchestratorError::DuplicateUnit(unit.name.clone()));
            }
        }

        let mut in_degree = vec![0_usize; self.units.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.units.len()];

        for (position, unit) in self.units.iter().enumerate() {
            for dependency in &unit.dependencies {
                if dependency.unit == unit.name {
                    return Err(OrchestratorError::SelfDependency(unit.name.clone()));
                }
                let Some(&target) = index.get(dependency.unit.as_str()) else {
                    return Err(OrchestratorError::UnknownDependency {
                        unit: unit.name.clone(),
                        dependency: dependency.unit.clone(),
                    });
                };
                if matches!(dependency.kind, DependencyKind::Reference { .. })
                    && self.units[target].endpoint.is_none()
                {
                    return Err(OrchestratorError::MissingEndpoint {
                        unit: unit.name.clone(),
                        dependency: dependency.unit.clone(),
                    });
                }
                in_degree[position] += 1;
                dependents[target].push(position);
            }
        }

        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(position, _)| position)
            .collect();
        let mut order = Vec::with_capacity(self.units.len());

        while let Some(position) = ready.pop_first() {
            order.push(self.units[position].name.clone());
            for &dependent in &dependents[position] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() != self.units.len() {
            let stuck = self
                .units
                .iter()
                .zip(&in_degree)
                .filter(|(_, degree)| **degree > 0)
                .map(|(unit, _)| unit.name.clone())
                .collect();
            return Err(OrchestratorError::Cycle(stuck));
        }

        Ok(order)
    }
}
