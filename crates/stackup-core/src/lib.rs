//! stackup-core - Platform-independent process supervision
//!
//! This crate provides the service data model, the launcher traits, and the
//! supervisor state machine that are shared across platform-specific
//! implementations and the entrypoint binary.

mod config;
mod error;
mod process;
mod supervisor;

pub use config::*;
pub use error::*;
pub use process::*;
pub use supervisor::*;
