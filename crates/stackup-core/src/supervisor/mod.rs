use crate::config::{ServiceRole, ServiceSpec};
use crate::error::SupervisorError;
use crate::process::{ProcessId, ServiceHandle, ServiceLauncher, ServiceStatus, TerminationResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

mod state;
pub use state::SupervisorState;

/// Reserved exit code for infrastructure failures: a background service
/// failed to spawn or exited while the foreground service was still active.
pub const EXIT_INFRA_FAILURE: i32 = 121;

/// Exit code reported when shutdown was driven by an external termination
/// request (128 + SIGTERM, the shell convention).
pub const EXIT_TERM_REQUEST: i32 = 143;

/// How long to wait for children to be reaped after a force kill.
const REAP_TIMEOUT: Duration = Duration::from_secs(2);

/// What ended the supervision run. Carried alongside the numeric exit code
/// so reserved codes stay distinguishable from a foreground service that
/// happens to exit with the same number.
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownTrigger {
    /// The foreground service reached a terminal state on its own.
    ForegroundExit(ServiceStatus),
    /// An external termination request (SIGTERM/SIGINT to the supervisor).
    TerminationRequest,
    /// A background service exited while the foreground was still active.
    BackgroundExit {
        service: String,
        status: ServiceStatus,
    },
    /// A service could not be spawned.
    SpawnFailure { service: String },
}

/// Final result of a supervision run.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorOutcome {
    pub trigger: ShutdownTrigger,
    pub code: i32,
}

impl SupervisorOutcome {
    fn from_trigger(trigger: ShutdownTrigger) -> Self {
        let code = match &trigger {
            ShutdownTrigger::ForegroundExit(status) => exit_code_for(status),
            ShutdownTrigger::TerminationRequest => EXIT_TERM_REQUEST,
            ShutdownTrigger::BackgroundExit { .. } | ShutdownTrigger::SpawnFailure { .. } => {
                EXIT_INFRA_FAILURE
            }
        };
        Self { trigger, code }
    }
}

/// Map a foreground terminal status to a process exit code.
fn exit_code_for(status: &ServiceStatus) -> i32 {
    match status {
        ServiceStatus::Exited(code) => code & 0xff,
        ServiceStatus::Signaled(signal) => 128 + signal,
        ServiceStatus::Failed(_) => EXIT_INFRA_FAILURE,
    }
}

/// Runtime state of one launched child. Transitions into a terminal state
/// exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildState {
    Starting,
    Running,
    Exited(i32),
    Signaled(i32),
    Failed(String),
}

impl ChildState {
    fn is_active(&self) -> bool {
        matches!(self, ChildState::Starting | ChildState::Running)
    }

    fn from_status(status: &ServiceStatus) -> Self {
        match status {
            ServiceStatus::Exited(code) => ChildState::Exited(*code),
            ServiceStatus::Signaled(signal) => ChildState::Signaled(*signal),
            ServiceStatus::Failed(err) => ChildState::Failed(err.clone()),
        }
    }
}

/// Entry in the child table. Owned exclusively by the supervise driver;
/// monitoring tasks report exits over the event channel and never touch
/// another child's entry. `pid` is `None` when the handle never reported
/// one; such children are waited on but never signalled.
struct ChildEntry {
    spec: ServiceSpec,
    pid: Option<ProcessId>,
    state: ChildState,
}

struct ChildEvent {
    index: usize,
    status: ServiceStatus,
}

/// Supervises an ordered stack of services: background children first, in
/// declared order, then a single foreground child whose lifetime bounds the
/// whole run.
pub struct Supervisor<L: ServiceLauncher> {
    launcher: Arc<L>,
    grace_period: Duration,
    shutdown: CancellationToken,
}

impl<L: ServiceLauncher> Supervisor<L> {
    pub fn new(launcher: L, grace_period: Duration) -> Self {
        Self {
            launcher: Arc::new(launcher),
            grace_period,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token cancelled by the hosting environment to request shutdown.
    /// Cancelling twice is a no-op.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Request shutdown programmatically. Equivalent to cancelling the
    /// shutdown token.
    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Launch every background spec in declared order, then the single
    /// foreground spec, and block until a shutdown trigger fires. Whatever
    /// fires first wins; all remaining children are then terminated in two
    /// phases (cooperative stop, bounded grace period, force kill).
    ///
    /// Returns `Err` only for configuration problems detected before any
    /// spawn. Spawn failures produce an infrastructure-failure outcome.
    pub async fn supervise(
        &self,
        specs: Vec<ServiceSpec>,
    ) -> Result<SupervisorOutcome, SupervisorError> {
        let foreground: Vec<&ServiceSpec> = specs
            .iter()
            .filter(|s| s.role == ServiceRole::Foreground)
            .collect();
        if foreground.len() != 1 {
            return Err(SupervisorError::Configuration(format!(
                "expected exactly one foreground service, found {}",
                foreground.len()
            )));
        }
        let foreground = foreground[0];

        let mut state = SupervisorState::Idle;
        let (events_tx, mut events_rx) = mpsc::channel(specs.len().max(1));
        let mut table: Vec<ChildEntry> = Vec::with_capacity(specs.len());

        state.transition(SupervisorState::LaunchingBackground);
        for spec in specs.iter().filter(|s| s.role == ServiceRole::Background) {
            if let Err(err) = self.launch_child(spec, &mut table, &events_tx).await {
                error!(service = %spec.name, error = %err, "background launch failed, aborting startup");
                state.transition(SupervisorState::ShuttingDown);
                self.shutdown_children(&mut table, &mut events_rx).await;
                state.transition(SupervisorState::Terminated);
                return Ok(SupervisorOutcome::from_trigger(
                    ShutdownTrigger::SpawnFailure {
                        service: spec.name.clone(),
                    },
                ));
            }
        }

        // A termination request delivered during startup short-circuits the
        // foreground launch.
        if self.shutdown.is_cancelled() {
            info!("termination requested during startup");
            state.transition(SupervisorState::ShuttingDown);
            self.shutdown_children(&mut table, &mut events_rx).await;
            state.transition(SupervisorState::Terminated);
            return Ok(SupervisorOutcome::from_trigger(
                ShutdownTrigger::TerminationRequest,
            ));
        }

        state.transition(SupervisorState::LaunchingForeground);
        let foreground_index = table.len();
        if let Err(err) = self.launch_child(foreground, &mut table, &events_tx).await {
            error!(service = %foreground.name, error = %err, "foreground launch failed");
            state.transition(SupervisorState::ShuttingDown);
            self.shutdown_children(&mut table, &mut events_rx).await;
            state.transition(SupervisorState::Terminated);
            return Ok(SupervisorOutcome::from_trigger(
                ShutdownTrigger::SpawnFailure {
                    service: foreground.name.clone(),
                },
            ));
        }

        state.transition(SupervisorState::Running);
        let trigger = loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("termination requested");
                    break ShutdownTrigger::TerminationRequest;
                }
                event = events_rx.recv() => {
                    // The driver keeps a sender alive, so the channel cannot
                    // close while children are active.
                    let Some(event) = event else {
                        break ShutdownTrigger::TerminationRequest;
                    };
                    let entry = &mut table[event.index];
                    entry.state = ChildState::from_status(&event.status);
                    if event.index == foreground_index {
                        info!(service = %entry.spec.name, status = ?event.status, "foreground service exited");
                        break ShutdownTrigger::ForegroundExit(event.status);
                    }
                    warn!(service = %entry.spec.name, status = ?event.status, "background service exited unexpectedly");
                    break ShutdownTrigger::BackgroundExit {
                        service: entry.spec.name.clone(),
                        status: event.status,
                    };
                }
            }
        };

        state.transition(SupervisorState::ShuttingDown);
        self.shutdown_children(&mut table, &mut events_rx).await;
        state.transition(SupervisorState::Terminated);

        Ok(SupervisorOutcome::from_trigger(trigger))
    }

    /// Spawn one child, register it in the table, and start its monitoring
    /// task. The task owns the handle and reports the terminal status once.
    async fn launch_child(
        &self,
        spec: &ServiceSpec,
        table: &mut Vec<ChildEntry>,
        events_tx: &mpsc::Sender<ChildEvent>,
    ) -> Result<(), SupervisorError> {
        let mut handle =
            self.launcher
                .spawn(spec)
                .await
                .map_err(|source| SupervisorError::Spawn {
                    service: spec.name.clone(),
                    source,
                })?;

        let index = table.len();
        // A reported pid is the OS confirming the start; a handle without
        // one stays Starting until its monitor observes a terminal status.
        let pid = handle.pid();
        let child_state = match pid {
            Some(_) => ChildState::Running,
            None => ChildState::Starting,
        };
        info!(service = %spec.name, pid = ?pid, role = ?spec.role, port = ?spec.bind_port, "service launched");
        table.push(ChildEntry {
            spec: spec.clone(),
            pid,
            state: child_state,
        });

        let tx = events_tx.clone();
        tokio::spawn(async move {
            let status = handle.wait().await;
            let _ = tx.send(ChildEvent { index, status }).await;
        });

        Ok(())
    }

    /// Two-phase teardown of every still-active child: cooperative stop
    /// first, then a force kill for anything that outlives the grace period.
    async fn shutdown_children(
        &self,
        table: &mut [ChildEntry],
        events_rx: &mut mpsc::Receiver<ChildEvent>,
    ) {
        // Apply exits that raced with the shutdown trigger so already-dead
        // children are not signalled again.
        while let Ok(event) = events_rx.try_recv() {
            table[event.index].state = ChildState::from_status(&event.status);
        }

        for entry in table.iter().filter(|e| e.state.is_active()) {
            let Some(pid) = entry.pid else {
                warn!(service = %entry.spec.name, "no pid recorded, cannot signal child");
                continue;
            };
            match self.launcher.terminate_gracefully(pid).await {
                TerminationResult::Success => {
                    debug!(service = %entry.spec.name, pid, "termination requested");
                }
                TerminationResult::ProcessNotFound => {
                    debug!(service = %entry.spec.name, pid, "process already gone");
                }
                other => {
                    warn!(service = %entry.spec.name, pid, result = ?other, "termination request failed");
                }
            }
        }

        let deadline = Instant::now() + self.grace_period;
        self.reap_until(table, events_rx, deadline).await;

        let stragglers: Vec<usize> = table
            .iter()
            .enumerate()
            .filter(|(_, e)| e.state.is_active())
            .map(|(i, _)| i)
            .collect();
        if stragglers.is_empty() {
            return;
        }

        warn!(
            count = stragglers.len(),
            "grace period elapsed, force-killing remaining services"
        );
        for index in stragglers {
            let entry = &table[index];
            let Some(pid) = entry.pid else {
                warn!(service = %entry.spec.name, "no pid recorded, cannot force-kill child");
                continue;
            };
            match self.launcher.force_kill(pid).await {
                TerminationResult::Success | TerminationResult::ProcessNotFound => {}
                other => {
                    warn!(service = %entry.spec.name, pid, result = ?other, "force kill failed");
                }
            }
        }

        let reap_deadline = Instant::now() + REAP_TIMEOUT;
        self.reap_until(table, events_rx, reap_deadline).await;

        for entry in table.iter_mut().filter(|e| e.state.is_active()) {
            warn!(service = %entry.spec.name, pid = ?entry.pid, "child not reaped before exit");
            entry.state = ChildState::Failed("not reaped before supervisor exit".to_string());
        }
    }

    /// Drain child-exit events until every child is terminal or the
    /// deadline passes.
    async fn reap_until(
        &self,
        table: &mut [ChildEntry],
        events_rx: &mut mpsc::Receiver<ChildEvent>,
        deadline: Instant,
    ) {
        while table.iter().any(|e| e.state.is_active()) {
            match timeout_at(deadline, events_rx.recv()).await {
                Ok(Some(event)) => {
                    let entry = &mut table[event.index];
                    entry.state = ChildState::from_status(&event.status);
                    debug!(service = %entry.spec.name, status = ?event.status, "child reaped");
                }
                Ok(None) | Err(_) => break,
            }
        }
    }
}
