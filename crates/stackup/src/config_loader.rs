//! Configuration loading: a JSON file named by the first CLI argument or the
//! `STACKUP_CONFIG` environment variable, falling back to the built-in stack.

use crate::stack;
use anyhow::{Context, Result};
use stackup_core::SupervisorConfig;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn load() -> Result<SupervisorConfig> {
    match config_path() {
        Some(path) => {
            info!(path = %path.display(), "loading service stack from config file");
            load_file(&path)
        }
        None => {
            info!("no config file given, using built-in service stack");
            Ok(stack::builtin_stack())
        }
    }
}

fn load_file(path: &Path) -> Result<SupervisorConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse(contents: &str) -> Result<SupervisorConfig> {
    let config: SupervisorConfig = serde_json::from_str(contents)?;
    Ok(config)
}

fn config_path() -> Option<PathBuf> {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("STACKUP_CONFIG").map(PathBuf::from))
}
