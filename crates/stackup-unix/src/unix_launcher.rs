#[cfg(unix)]
mod unix_impl {
    use async_trait::async_trait;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid as NixPid;
    use stackup_core::{
        ProcessId, ServiceHandle, ServiceLauncher, ServiceSpec, ServiceStatus, SpawnError,
        TerminationResult,
    };
    use tokio::process::{Child, Command};
    use tracing::{info, warn};

    /// Unix-specific handle wrapping a spawned child.
    pub struct UnixServiceHandle {
        child: Child,
        name: String,
    }

    impl UnixServiceHandle {
        pub fn new(child: Child, name: String) -> Self {
            Self { child, name }
        }
    }

    #[async_trait]
    impl ServiceHandle for UnixServiceHandle {
        fn pid(&self) -> Option<ProcessId> {
            self.child.id()
        }

        async fn wait(&mut self) -> ServiceStatus {
            match self.child.wait().await {
                Ok(status) => {
                    if let Some(code) = status.code() {
                        ServiceStatus::Exited(code)
                    } else {
                        use std::os::unix::process::ExitStatusExt;
                        ServiceStatus::Signaled(status.signal().unwrap_or(0))
                    }
                }
                Err(err) => {
                    warn!(service = %self.name, error = %err, "wait on child failed");
                    ServiceStatus::Failed(err.to_string())
                }
            }
        }
    }

    /// Unix launcher. Every service gets its own process group, so a
    /// termination request addressed at the service reaches any helper
    /// processes it forked.
    #[derive(Default)]
    pub struct UnixLauncher;

    impl UnixLauncher {
        pub fn new() -> Self {
            Self
        }
    }

    #[async_trait]
    impl ServiceLauncher for UnixLauncher {
        type Handle = UnixServiceHandle;

        async fn spawn(&self, spec: &ServiceSpec) -> Result<Self::Handle, SpawnError> {
            let mut cmd = Command::new(&spec.command);
            cmd.args(&spec.args);

            if let Some(dir) = &spec.working_directory {
                cmd.current_dir(dir);
            }

            // Spec env merges over the inherited environment; override wins.
            for (key, value) in &spec.env {
                cmd.env(key, value);
            }

            // New process group so signals reach the whole service tree.
            cmd.process_group(0);

            let child = cmd
                .spawn()
                .map_err(|err| SpawnError::classify(&spec.command, err))?;

            if let Some(pid) = child.id() {
                info!(
                    service = %spec.name,
                    pid,
                    command = %spec.command,
                    port = ?spec.bind_port,
                    "spawned service"
                );
            }

            Ok(UnixServiceHandle::new(child, spec.name.clone()))
        }

        async fn terminate_gracefully(&self, pid: ProcessId) -> TerminationResult {
            self.signal_group(pid, Signal::SIGTERM)
        }

        async fn force_kill(&self, pid: ProcessId) -> TerminationResult {
            self.signal_group(pid, Signal::SIGKILL)
        }
    }

    impl UnixLauncher {
        /// Signal the service's process group. The group leader pid equals
        /// the child pid because spawn placed it in a fresh group.
        fn signal_group(&self, pid: ProcessId, signal: Signal) -> TerminationResult {
            let pgid = NixPid::from_raw(pid as i32);

            match signal::killpg(pgid, signal) {
                Ok(()) => {
                    info!(pid, signal = %signal, "signalled process group");
                    TerminationResult::Success
                }
                Err(nix::errno::Errno::ESRCH) => {
                    info!(pid, "process group not found (already terminated)");
                    TerminationResult::ProcessNotFound
                }
                Err(nix::errno::Errno::EPERM) => {
                    warn!(pid, signal = %signal, "permission denied signalling process group");
                    TerminationResult::AccessDenied
                }
                Err(err) => {
                    warn!(pid, signal = %signal, error = %err, "failed to signal process group");
                    TerminationResult::Failed(format!("{signal} failed: {err}"))
                }
            }
        }
    }
}

// Re-export the Unix implementation when on Unix systems
#[cfg(unix)]
pub use unix_impl::{UnixLauncher, UnixServiceHandle};

// Provide stub implementations for non-Unix systems
#[cfg(not(unix))]
pub struct UnixServiceHandle;

#[cfg(not(unix))]
pub struct UnixLauncher;

#[cfg(not(unix))]
impl UnixLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(unix))]
impl Default for UnixLauncher {
    fn default() -> Self {
        Self::new()
    }
}
