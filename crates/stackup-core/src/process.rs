use async_trait::async_trait;

use crate::config::ServiceSpec;

/// Unique identifier for a process
pub type ProcessId = u32;

/// Terminal observation of a child process.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceStatus {
    /// Process exited on its own with the given exit code.
    Exited(i32),
    /// Process was terminated by the given signal.
    Signaled(i32),
    /// The process could not be observed to completion.
    Failed(String),
}

/// Result of a termination request sent to a child.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminationResult {
    /// The termination request was delivered.
    Success,
    /// Process was not found (already exited).
    ProcessNotFound,
    /// Insufficient privileges to signal the process.
    AccessDenied,
    /// Operation failed with specific error message.
    Failed(String),
}

/// Error raised when the OS refuses to create a child process. Fatal to the
/// whole run; never retried.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("executable not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Classify a spawn-time IO error by its kind.
    pub fn classify(command: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => SpawnError::NotFound(command.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                SpawnError::PermissionDenied(command.to_string())
            }
            _ => SpawnError::Io(err),
        }
    }
}

/// Handle to a launched child. Created at spawn time, consumed by the
/// monitoring task that waits on it; never reused.
#[async_trait]
pub trait ServiceHandle: Send {
    /// Get the process ID (None if the process never reported one).
    fn pid(&self) -> Option<ProcessId>;

    /// Wait for the process to reach a terminal state. Wait errors fold
    /// into `ServiceStatus::Failed` so monitors always observe exactly one
    /// terminal status.
    async fn wait(&mut self) -> ServiceStatus;
}

/// Platform seam for launching and signalling services.
///
/// `spawn` returns once the OS has accepted the spawn request, not once the
/// service is ready to serve traffic; no readiness probing happens here.
/// Termination is pid-addressed so the supervisor can signal children whose
/// handles are owned by their monitoring tasks.
#[async_trait]
pub trait ServiceLauncher: Send + Sync + 'static {
    /// The type of handle this launcher produces.
    type Handle: ServiceHandle + 'static;

    /// Spawn a new child for the given spec. Non-blocking.
    async fn spawn(&self, spec: &ServiceSpec) -> Result<Self::Handle, SpawnError>;

    /// Request a cooperative stop (SIGTERM on Unix).
    async fn terminate_gracefully(&self, pid: ProcessId) -> TerminationResult;

    /// Force the child to stop (SIGKILL on Unix). Best-effort.
    async fn force_kill(&self, pid: ProcessId) -> TerminationResult;
}
