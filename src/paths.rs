//! Centralized path resolution for runner artifacts.
//!
//! All fixed file locations (checkpoint file, log file, installers
//! directory) are resolved once into a `Paths` value object and passed
//! into components at construction. Nothing in the crate reaches for an
//! ambient global path.

use std::path::{Path, PathBuf};

/// Resolved locations for every file the runner touches.
///
/// By default everything lives next to the executable so that the
/// resume trigger (which replays the exact executable path) finds the
/// same state after a reboot.
#[derive(Clone, Debug)]
pub struct Paths {
    /// Durable checkpoint record (JSON)
    pub state_file: PathBuf,

    /// Append-only run log
    pub log_file: PathBuf,

    /// Directory scanned by the batch-install step
    pub installers_dir: PathBuf,
}

impl Paths {
    /// Anchor all paths under the given root directory.
    pub fn with_root(root: &Path) -> Self {
        Paths {
            state_file: root.join("provision_state.json"),
            log_file: root.join("provision.log"),
            installers_dir: root.join("installers"),
        }
    }

    /// Resolve paths relative to the running executable.
    ///
    /// Falls back to the user-local data directory, then the current
    /// working directory, when the executable location cannot be
    /// determined (e.g., deleted-binary edge cases).
    pub fn resolve() -> Self {
        let root = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
            .or_else(|| dirs::data_local_dir().map(|d| d.join("provision_runner")))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::with_root(&root)
    }
}
