//! Durable checkpoint store for orchestration progress.
//!
//! The checkpoint is the sole persisted entity: a JSON record holding
//! the number of fully completed steps plus, for the batch-install
//! step, the identifiers of installer files already applied. It is the
//! idempotent resume marker consulted after an uncontrolled process
//! exit or a full machine reboot.
//!
//! Corrupt or structurally invalid records are self-healing: `load`
//! discards them (deleting the file best-effort) and starts fresh from
//! `{step: 0}`. A corrupt checkpoint is never a fatal error.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// Persisted orchestration progress.
///
/// `step` counts fully completed steps and only ever increases.
/// `completed_files` tracks sub-items finished within the current
/// batch-install step; readers must tolerate the field being absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Number of steps fully completed (>= 0)
    pub step: u32,

    /// Installer files already applied within the batch-install step
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed_files: Vec<String>,
}

impl Checkpoint {
    /// True if the given installer file was already applied.
    pub fn is_file_completed(&self, id: &str) -> bool {
        self.completed_files.iter().any(|f| f == id)
    }

    /// Record an installer file as applied (idempotent).
    pub fn mark_file_completed(&mut self, id: &str) {
        if !self.is_file_completed(id) {
            self.completed_files.push(id.to_string());
        }
    }
}

/// File-backed checkpoint store with atomic writes.
#[derive(Clone, Debug)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: PathBuf) -> Self {
        CheckpointStore { path }
    }

    /// Location of the persisted record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted record, returning fresh `{step: 0}` state if
    /// the file is absent, unreadable, or structurally invalid.
    ///
    /// An invalid record is deleted as a side effect so the next save
    /// starts clean; deletion failure is logged, not fatal.
    pub fn load(&self) -> Checkpoint {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No checkpoint at {:?}, starting fresh", self.path);
                return Checkpoint::default();
            }
            Err(e) => {
                log::warn!("Checkpoint at {:?} unreadable ({}), starting fresh", self.path, e);
                self.discard_corrupt();
                return Checkpoint::default();
            }
        };

        match serde_json::from_str::<Checkpoint>(&raw) {
            Ok(checkpoint) => {
                log::debug!("Loaded checkpoint: {:?}", checkpoint);
                checkpoint
            }
            Err(e) => {
                log::warn!("Checkpoint corrupt ({}), removing and starting fresh", e);
                self.discard_corrupt();
                Checkpoint::default()
            }
        }
    }

    /// Overwrite the record atomically: a reader never observes a
    /// partially written checkpoint. Must be called after every step
    /// transition, including immediately before a reboot is issued.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), StateError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir)?;

        // Write to a sibling temp file, then rename over the target.
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer(&mut tmp, checkpoint)?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| StateError::Persist(e.to_string()))?;

        log::debug!("Saved checkpoint {:?} to {:?}", checkpoint, self.path);
        Ok(())
    }

    fn discard_corrupt(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::error!("Failed to delete corrupt checkpoint {:?}: {}", self.path, e);
            }
        }
    }
}
