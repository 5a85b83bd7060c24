//! Container entrypoint: supervises the backend API and the dashboard as one
//! process group and exits with the supervised outcome's code.

mod config_loader;
mod signals;
mod stack;

use anyhow::{Context, Result};
use stackup_core::Supervisor;
use stackup_unix::UnixLauncher;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let code = match run().await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %format!("{err:#}"), "supervisor failed to start");
            1
        }
    };

    std::process::exit(code);
}

async fn run() -> Result<i32> {
    let config = config_loader::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    let supervisor = Supervisor::new(UnixLauncher::new(), config.grace_period());
    signals::spawn_signal_listener(supervisor.shutdown_token())?;

    let outcome = supervisor.supervise(config.services).await?;
    info!(code = outcome.code, trigger = ?outcome.trigger, "supervision finished");

    Ok(outcome.code)
}
