//! stackup-unix - Unix implementation of the service launcher
//!
//! Spawns services with `tokio::process`, each in its own process group so
//! termination reaches the whole service tree, and delivers SIGTERM/SIGKILL
//! via `nix`.

mod unix_launcher;

pub use unix_launcher::{UnixLauncher, UnixServiceHandle};
