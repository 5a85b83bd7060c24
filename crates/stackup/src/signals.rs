//! Signal handling for graceful shutdown.
//!
//! SIGTERM and SIGINT are forwarded to the supervisor's cancellation token.
//! Cancelling the token is idempotent, so repeated signals after shutdown
//! has begun have no additional effect.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Register signal handlers and spawn the forwarding task.
#[cfg(unix)]
pub fn spawn_signal_listener(token: CancellationToken) -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to register SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("failed to register SIGINT handler")?;

    tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            };
            info!(signal = name, "termination signal received");
            token.cancel();
        }
    });

    Ok(())
}

#[cfg(not(unix))]
pub fn spawn_signal_listener(token: CancellationToken) -> Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(signal = "Ctrl+C", "termination signal received");
            token.cancel();
        }
    });

    Ok(())
}
