//! Batch-install step: ordered sequence of independent installer files.
//!
//! Scans a staging directory in file-name order and applies each
//! installer through the step runner. Every completed file is recorded
//! in the checkpoint's `completed_files` set and re-persisted at once,
//! so a reboot mid-batch resumes with only the remaining files.

use std::path::PathBuf;

use crate::runner::{run_installer_file, StepOutcome};
use crate::steps::{Step, StepContext};

/// Batch-install step over a directory of installer files.
#[derive(Clone, Debug)]
pub struct InstallFilesStep {
    dir: PathBuf,
}

impl InstallFilesStep {
    pub fn new(dir: PathBuf) -> Self {
        InstallFilesStep { dir }
    }

    /// Regular files in the staging directory, sorted by file name.
    /// The sort fixes the install order across invocations.
    fn installer_files(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect();
        files.sort();
        Ok(files)
    }
}

impl Step for InstallFilesStep {
    fn name(&self) -> &str {
        "install-files"
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> StepOutcome {
        let files = match self.installer_files() {
            Ok(files) => files,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No installers directory at {:?}, nothing to do", self.dir);
                return StepOutcome::NoActionNeeded;
            }
            Err(e) => {
                return StepOutcome::Failed {
                    code: None,
                    output: format!("failed to scan {:?}: {}", self.dir, e),
                }
            }
        };
        if files.is_empty() {
            log::info!("Installers directory {:?} is empty", self.dir);
            return StepOutcome::NoActionNeeded;
        }

        let mut installed = 0u32;
        let mut reboot_needed = false;
        let mut failures: Vec<String> = Vec::new();

        for file in &files {
            let id = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file.to_string_lossy().to_string());
            if ctx.checkpoint.is_file_completed(&id) {
                log::info!("Skipping already-installed file: {}", id);
                continue;
            }

            match run_installer_file(file) {
                StepOutcome::Failed { code, output } => {
                    // Not marked complete: the file is retried on the
                    // next run. Remaining files still get their shot.
                    log::error!("Installer '{}' failed (code {:?}): {}", id, code, output);
                    failures.push(format!("{} (exit {:?})", id, code));
                    continue;
                }
                StepOutcome::RebootRequired => {
                    reboot_needed = true;
                }
                _ => {}
            }

            installed += 1;
            ctx.checkpoint.mark_file_completed(&id);
            if let Err(e) = ctx.store.save(ctx.checkpoint) {
                log::warn!("Failed to persist file-completion marker: {}", e);
            }
        }

        if !failures.is_empty() {
            StepOutcome::Failed {
                code: None,
                output: format!("{} installer(s) failed: {}", failures.len(), failures.join(", ")),
            }
        } else if reboot_needed {
            StepOutcome::RebootRequired
        } else if installed == 0 {
            StepOutcome::NoActionNeeded
        } else {
            StepOutcome::Success
        }
    }
}
