//! Unit lifecycle states

use std::fmt;

/// `Pending -> WaitingOnDependencies -> Starting -> Ready -> Stopped`, with
/// `Failed` reachable from any state before `Stopped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    WaitingOnDependencies,
    Starting,
    Ready,
    Stopped,
    Failed(String),
}

impl UnitState {
    pub fn is_ready(&self) -> bool {
        matches!(self, UnitState::Ready)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, UnitState::Failed(_))
    }

    /// Ready or Failed: a dependent waiting on this unit can stop waiting
    pub fn is_settled(&self) -> bool {
        self.is_ready() || self.is_failed()
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitState::Pending => write!(f, "pending"),
            UnitState::WaitingOnDependencies => write!(f, "waiting-on-dependencies"),
            UnitState::Starting => write!(f, "starting"),
            UnitState::Ready => write!(f, "ready"),
            UnitState::Stopped => write!(f, "stopped"),
            UnitState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}
