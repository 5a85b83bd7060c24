use std::fmt;
use tracing::debug;

/// Phases of a single supervision run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    LaunchingBackground,
    LaunchingForeground,
    Running,
    ShuttingDown,
    Terminated,
}

impl SupervisorState {
    pub(crate) fn transition(&mut self, next: SupervisorState) {
        debug!(from = %self, to = %next, "supervisor state change");
        *self = next;
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SupervisorState::Idle => "idle",
            SupervisorState::LaunchingBackground => "launching-background",
            SupervisorState::LaunchingForeground => "launching-foreground",
            SupervisorState::Running => "running",
            SupervisorState::ShuttingDown => "shutting-down",
            SupervisorState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}
