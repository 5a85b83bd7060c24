use thiserror::Error;

use crate::process::SpawnError;

/// Errors that abort a supervision run before it produces an outcome.
///
/// Runtime shutdown triggers (foreground exit, unexpected background exit,
/// external termination request) are not errors; they are folded into the
/// `ShutdownTrigger` carried by the outcome.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to spawn service '{service}': {source}")]
    Spawn {
        service: String,
        #[source]
        source: SpawnError,
    },
}
